// ABOUTME: Terminal per-service results produced by the stage scheduler.
// ABOUTME: Outcomes are moved into the deployment report once every tier has finished.

use serde::Serialize;
use std::fmt;

use crate::probe::ProbeResult;
use crate::types::ServiceName;

/// Terminal status of a service after its tier completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Ready,
    TimedOut,
    Errored,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Ready => "ready",
            ServiceStatus::TimedOut => "timed out",
            ServiceStatus::Errored => "errored",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceOutcome {
    pub service: ServiceName,
    pub tier: u32,
    pub status: ServiceStatus,
    pub attempts: Vec<ProbeResult>,
    pub total_elapsed_ms: u64,
    /// Why the service is not ready. Always `None` for ready services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ServiceOutcome {
    pub fn is_ready(&self) -> bool {
        self.status == ServiceStatus::Ready
    }

    /// Offset of the first probe attempt from the start of the run.
    pub fn first_attempt_offset_ms(&self) -> Option<u64> {
        self.attempts.first().map(|a| a.offset_ms)
    }
}
