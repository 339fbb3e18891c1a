// ABOUTME: External collaborators invoked around and during a deployment.
// ABOUTME: Per-service start/stop actions plus pre/post lifecycle scripts.

mod lifecycle;
mod service;

pub use lifecycle::{HookContext, HookPoint, HookResult, HookRunner};
pub use service::{CommandHooks, NoopHooks, ServiceHooks, StartError, StopError};
