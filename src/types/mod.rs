// ABOUTME: Validated domain types shared across the crate.
// ABOUTME: Currently the service name used to key the registry and reports.

mod service_name;

pub use service_name::{ServiceName, ServiceNameError};
