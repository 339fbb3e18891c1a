// ABOUTME: Readiness probes and the runner that times and classifies each attempt.
// ABOUTME: Exposes the Prober trait seam plus the HTTP, TCP, and exec implementations.

mod error;
mod exec;
mod http;
mod tcp;

pub use error::{ProbeError, ProbeErrorKind};
pub use exec::check_exec;
pub use http::check_http;
pub use tcp::check_tcp;

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{ProbeCheck, ServiceSpec};
use crate::types::ServiceName;

/// Result of a single readiness check that could be carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    NotReady(String),
}

/// Performs one readiness check for a service.
///
/// Implementations return `Ok(Readiness::NotReady(_))` for expected negative
/// outcomes and reserve `Err` for targets that can never be probed.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn check(&self, service: &ServiceSpec) -> Result<Readiness, ProbeError>;
}

/// Probes real endpoints: HTTP GET, TCP connect, or process exit code.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkProber;

#[async_trait]
impl Prober for NetworkProber {
    async fn check(&self, service: &ServiceSpec) -> Result<Readiness, ProbeError> {
        match &service.probe.check {
            ProbeCheck::Http { url, expect_status } => check_http(url, expect_status).await,
            ProbeCheck::Tcp { address } => check_tcp(address).await,
            ProbeCheck::Exec { command } => check_exec(command).await,
        }
    }
}

/// Outcome of one probe attempt. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub service: ServiceName,
    /// 1-based attempt number.
    pub attempt: u32,
    pub success: bool,
    /// How long the attempt itself took.
    pub elapsed_ms: u64,
    /// When the attempt began, relative to the start of the run.
    pub offset_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs single attempts with a per-attempt timeout and turns them into
/// [`ProbeResult`]s.
#[derive(Clone)]
pub struct ProbeRunner {
    prober: Arc<dyn Prober>,
    epoch: Instant,
}

impl ProbeRunner {
    /// `epoch` is the instant offsets are measured from.
    pub fn new(prober: Arc<dyn Prober>, epoch: Instant) -> Self {
        Self { prober, epoch }
    }

    pub fn epoch(&self) -> Instant {
        self.epoch
    }

    /// Run attempt number `attempt` against `service`.
    ///
    /// # Errors
    ///
    /// Returns the prober's hard error unchanged; the caller decides what it
    /// means for the service.
    pub async fn attempt(
        &self,
        service: &ServiceSpec,
        attempt: u32,
    ) -> Result<ProbeResult, ProbeError> {
        self.attempt_within(service, attempt, service.attempt_timeout())
            .await
    }

    /// Like [`attempt`](Self::attempt), but gives up after `limit` instead of
    /// the service's own attempt timeout.
    pub async fn attempt_within(
        &self,
        service: &ServiceSpec,
        attempt: u32,
        limit: Duration,
    ) -> Result<ProbeResult, ProbeError> {
        let started = Instant::now();

        let readiness = match tokio::time::timeout(limit, self.prober.check(service)).await {
            Ok(result) => result?,
            Err(_elapsed) => Readiness::NotReady(format!(
                "probe timed out after {}",
                humantime::format_duration(limit)
            )),
        };

        let (success, error) = match readiness {
            Readiness::Ready => (true, None),
            Readiness::NotReady(detail) => (false, Some(detail)),
        };

        tracing::debug!(
            service = %service.name,
            attempt,
            success,
            error = error.as_deref().unwrap_or(""),
            "probe attempt finished"
        );

        Ok(ProbeResult {
            service: service.name.clone(),
            attempt,
            success,
            elapsed_ms: millis(started.elapsed()),
            offset_ms: millis(started.saturating_duration_since(self.epoch)),
            error,
        })
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
