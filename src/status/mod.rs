// ABOUTME: Live deployment status for dashboards and automation.
// ABOUTME: A shared board of service states and the HTTP server that exposes it.

mod board;
mod server;

pub use board::{LiveState, StatusBoard, StatusSnapshot};
pub use server::{StatusServer, route};
