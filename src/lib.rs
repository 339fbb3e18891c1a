// ABOUTME: Library root for muster - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod error;
pub mod hooks;
pub mod output;
pub mod probe;
pub mod report;
pub mod status;
pub mod types;
