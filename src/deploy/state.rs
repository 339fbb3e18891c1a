// ABOUTME: Per-service wait state using the type state pattern.
// ABOUTME: Pending -> Probing -> terminal; reaching a terminal state consumes the tracker.

use std::time::Duration;
use tokio::time::Instant;

use super::outcome::{ServiceOutcome, ServiceStatus};
use crate::config::ServiceSpec;
use crate::probe::{ProbeResult, millis};
use crate::types::ServiceName;

/// Not yet probed (start hook may still be running).
#[derive(Debug, Clone, Copy, Default)]
pub struct Pending;

/// Probe loop running; collects attempts.
#[derive(Debug, Clone)]
pub struct Probing {
    started: Instant,
    attempts: Vec<ProbeResult>,
}

/// Tracks one service through its wait loop.
///
/// Terminal transitions (`ready`, `timed_out`, `errored`) consume the
/// tracker and return a [`ServiceOutcome`], so a finished service cannot be
/// probed again.
#[derive(Debug)]
pub struct ServiceTracker<S> {
    service: ServiceName,
    tier: u32,
    state: S,
}

impl<S> ServiceTracker<S> {
    pub fn service(&self) -> &ServiceName {
        &self.service
    }

    pub fn tier(&self) -> u32 {
        self.tier
    }
}

impl ServiceTracker<Pending> {
    pub fn new(spec: &ServiceSpec) -> Self {
        Self {
            service: spec.name.clone(),
            tier: spec.tier,
            state: Pending,
        }
    }

    /// Start the wait loop; elapsed time is measured from `now`.
    #[must_use = "tracker state must be used"]
    pub fn begin(self, now: Instant) -> ServiceTracker<Probing> {
        ServiceTracker {
            service: self.service,
            tier: self.tier,
            state: Probing {
                started: now,
                attempts: Vec::new(),
            },
        }
    }

    /// Give up before any probe ran (failed start hook, aborted run).
    pub fn errored(self, reason: impl Into<String>) -> ServiceOutcome {
        ServiceOutcome {
            service: self.service,
            tier: self.tier,
            status: ServiceStatus::Errored,
            attempts: Vec::new(),
            total_elapsed_ms: 0,
            reason: Some(reason.into()),
        }
    }
}

impl ServiceTracker<Probing> {
    pub fn record(&mut self, result: ProbeResult) {
        self.state.attempts.push(result);
    }

    pub fn attempts(&self) -> &[ProbeResult] {
        &self.state.attempts
    }

    pub fn started(&self) -> Instant {
        self.state.started
    }

    pub fn elapsed(&self) -> Duration {
        self.state.started.elapsed()
    }

    pub fn ready(self) -> ServiceOutcome {
        self.finish(ServiceStatus::Ready, None)
    }

    pub fn timed_out(self, timeout: Duration) -> ServiceOutcome {
        let last = self
            .state
            .attempts
            .last()
            .and_then(|a| a.error.clone())
            .map(|e| format!("; last error: {e}"))
            .unwrap_or_default();
        let reason = format!(
            "not ready after {}{}",
            humantime::format_duration(timeout),
            last
        );
        self.finish(ServiceStatus::TimedOut, Some(reason))
    }

    pub fn errored(self, reason: impl Into<String>) -> ServiceOutcome {
        self.finish(ServiceStatus::Errored, Some(reason.into()))
    }

    fn finish(self, status: ServiceStatus, reason: Option<String>) -> ServiceOutcome {
        ServiceOutcome {
            service: self.service,
            tier: self.tier,
            status,
            total_elapsed_ms: millis(self.state.started.elapsed()),
            attempts: self.state.attempts,
            reason,
        }
    }
}
