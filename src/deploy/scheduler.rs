// ABOUTME: Tier-by-tier startup with concurrent per-service readiness polling.
// ABOUTME: A tier completes only when every one of its services is terminal.

use futures::FutureExt;
use futures::future::join_all;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::outcome::ServiceOutcome;
use super::state::ServiceTracker;
use crate::config::{Registry, ServiceSpec};
use crate::hooks::ServiceHooks;
use crate::probe::ProbeRunner;
use crate::status::{LiveState, StatusBoard};
use crate::types::ServiceName;

pub const ABORTED: &str = "aborted";
pub const ABORTED_BEFORE_START: &str = "aborted before start";

/// What the scheduler hands back to the deployer.
#[derive(Debug, Default)]
pub struct ScheduleResult {
    /// One outcome per registry entry, in tier order.
    pub outcomes: Vec<ServiceOutcome>,
    /// Services whose start hook succeeded, in the order they were started.
    pub started: Vec<ServiceName>,
    pub aborted: bool,
}

pub struct StageScheduler {
    registry: Arc<Registry>,
    hooks: Arc<dyn ServiceHooks>,
    runner: ProbeRunner,
    board: StatusBoard,
}

impl StageScheduler {
    pub fn new(
        registry: Arc<Registry>,
        hooks: Arc<dyn ServiceHooks>,
        runner: ProbeRunner,
        board: StatusBoard,
    ) -> Self {
        Self {
            registry,
            hooks,
            runner,
            board,
        }
    }

    /// Run every tier in order. Never fails: problems end up in outcomes.
    pub async fn run(&self, abort: &CancellationToken) -> ScheduleResult {
        let mut result = ScheduleResult {
            outcomes: Vec::with_capacity(self.registry.len()),
            ..Default::default()
        };

        for (tier, services) in self.registry.tiers().into_iter().enumerate() {
            if services.is_empty() {
                continue;
            }

            if abort.is_cancelled() {
                for spec in services {
                    self.board.set_state(spec.name.as_str(), LiveState::Errored);
                    result
                        .outcomes
                        .push(ServiceTracker::new(spec).errored(ABORTED_BEFORE_START));
                }
                continue;
            }

            tracing::info!(tier, services = services.len(), "starting tier");
            let mut outcomes = self.run_tier(&services, abort, &mut result.started).await;

            // Report in registry order, not completion order.
            outcomes.sort_by_key(|o| services.iter().position(|s| s.name == o.service));

            let ready = outcomes.iter().filter(|o| o.is_ready()).count();
            tracing::info!(tier, ready, total = outcomes.len(), "tier finished");
            result.outcomes.extend(outcomes);
        }

        result.aborted = abort.is_cancelled();
        result
    }

    async fn run_tier(
        &self,
        services: &[&ServiceSpec],
        abort: &CancellationToken,
        started: &mut Vec<ServiceName>,
    ) -> Vec<ServiceOutcome> {
        // Every start hook of the tier returns before any probing begins.
        // An abort abandons hooks still in flight.
        let starts = join_all(services.iter().map(|&spec| async move {
            self.board.set_state(spec.name.as_str(), LiveState::Starting);
            tokio::select! {
                biased;
                _ = abort.cancelled() => (spec, None),
                start = self.hooks.start(&spec.name) => (spec, Some(start)),
            }
        }))
        .await;

        let mut outcomes = Vec::with_capacity(services.len());
        let mut tasks = JoinSet::new();

        for (spec, start) in starts {
            match start {
                None => {
                    tracing::warn!(service = %spec.name, "start abandoned: deployment aborted");
                    self.board.set_state(spec.name.as_str(), LiveState::Errored);
                    outcomes.push(ServiceTracker::new(spec).errored(ABORTED));
                }
                Some(Ok(())) => {
                    started.push(spec.name.clone());
                    tasks.spawn(wait_ready(
                        spec.clone(),
                        self.runner.clone(),
                        self.board.clone(),
                        abort.clone(),
                    ));
                }
                Some(Err(e)) => {
                    tracing::warn!(service = %spec.name, "start failed: {}", e);
                    self.board.set_state(spec.name.as_str(), LiveState::Errored);
                    outcomes.push(ServiceTracker::new(spec).errored(e.to_string()));
                }
            }
        }

        // Tier barrier.
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("probe task failed to join: {}", e),
            }
        }

        outcomes
    }
}

/// Poll one service until it is ready, times out, hits a hard probe error,
/// or the run is aborted.
async fn wait_ready(
    spec: ServiceSpec,
    runner: ProbeRunner,
    board: StatusBoard,
    abort: CancellationToken,
) -> ServiceOutcome {
    let name = spec.name.clone();
    let pending = ServiceTracker::new(&spec);

    let outcome = match AssertUnwindSafe(poll_until_terminal(&spec, pending, &runner, &board, &abort))
        .catch_unwind()
        .await
    {
        Ok(outcome) => outcome,
        Err(_) => {
            tracing::error!(service = %name, "probe task panicked");
            ServiceTracker::new(&spec).errored("probe task panicked")
        }
    };

    match &outcome.reason {
        None => tracing::info!(
            service = %name,
            attempts = outcome.attempts.len(),
            elapsed_ms = outcome.total_elapsed_ms,
            "service ready"
        ),
        Some(reason) => tracing::warn!(
            service = %name,
            status = %outcome.status,
            attempts = outcome.attempts.len(),
            "service not ready: {}",
            reason
        ),
    }

    board.set_state(name.as_str(), outcome.status.into());
    outcome
}

async fn poll_until_terminal(
    spec: &ServiceSpec,
    pending: ServiceTracker<super::state::Pending>,
    runner: &ProbeRunner,
    board: &StatusBoard,
    abort: &CancellationToken,
) -> ServiceOutcome {
    // First attempt happens immediately after the start hook.
    let mut tracker = pending.begin(Instant::now());
    let deadline = tracker.started() + spec.timeout;
    // No attempt may still be running one interval past the deadline.
    let hard_stop = deadline + spec.interval.saturating_sub(Duration::from_millis(1));
    board.set_state(spec.name.as_str(), LiveState::Probing);

    let mut attempt = 0u32;
    loop {
        if abort.is_cancelled() {
            return tracker.errored(ABORTED);
        }

        attempt += 1;
        let attempt_started = Instant::now();
        let limit = spec
            .attempt_timeout()
            .min(hard_stop.saturating_duration_since(attempt_started));
        match runner.attempt_within(spec, attempt, limit).await {
            Ok(result) => {
                let success = result.success;
                tracker.record(result);
                if success {
                    return tracker.ready();
                }
            }
            Err(e) => return tracker.errored(format!("probe error: {e}")),
        }

        let now = Instant::now();
        if now >= deadline {
            return tracker.timed_out(spec.timeout);
        }

        // Cooperative deadline: the last attempt lands exactly on it.
        let next = (attempt_started + spec.interval).min(deadline);
        tokio::select! {
            biased;
            _ = abort.cancelled() => return tracker.errored(ABORTED),
            _ = tokio::time::sleep_until(next) => {}
        }
    }
}
