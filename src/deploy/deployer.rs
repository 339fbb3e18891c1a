// ABOUTME: Entry point that drives the registry through the scheduler and reporter.
// ABOUTME: Owns the explicit config, the injected hooks and prober, and the status board.

use chrono::Utc;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::scheduler::StageScheduler;
use crate::config::{Config, Registry, ServiceSpec};
use crate::diagnostics::{Diagnostics, Warning};
use crate::hooks::{CommandHooks, NoopHooks, ServiceHooks};
use crate::probe::{NetworkProber, ProbeRunner, Prober};
use crate::report::{DeploymentReport, RunInfo, build_report};
use crate::status::StatusBoard;
use crate::types::ServiceName;

pub struct Deployer {
    config: Config,
    registry: Arc<Registry>,
    hooks: Arc<dyn ServiceHooks>,
    prober: Arc<dyn Prober>,
    board: StatusBoard,
    stop_on_abort: bool,
}

impl Deployer {
    pub fn new(config: Config, hooks: Arc<dyn ServiceHooks>, prober: Arc<dyn Prober>) -> Self {
        let registry = Arc::new(config.registry.clone());
        let board = StatusBoard::new(config.platform.clone(), &registry);
        Self {
            config,
            registry,
            hooks,
            prober,
            board,
            stop_on_abort: false,
        }
    }

    /// Real probes, and command hooks when the config defines any.
    pub fn from_config(config: Config) -> Self {
        let hooks: Arc<dyn ServiceHooks> =
            if config.hooks.start.is_some() || config.hooks.stop.is_some() {
                Arc::new(CommandHooks::new(&config.hooks, config.platform.clone()))
            } else {
                Arc::new(NoopHooks)
            };
        Self::new(config, hooks, Arc::new(NetworkProber))
    }

    /// Stop already-started services when the run is aborted.
    pub fn stop_on_abort(mut self, enabled: bool) -> Self {
        self.stop_on_abort = enabled;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn board(&self) -> StatusBoard {
        self.board.clone()
    }

    /// Tiers in the order they would run, without touching anything.
    pub fn plan(&self) -> Vec<Vec<&ServiceSpec>> {
        self.registry.tiers()
    }

    /// Run one full deployment pass.
    ///
    /// Cancelling `abort` stops probing at the next poll boundary; services
    /// not yet started are skipped. The report is also published to the
    /// status board.
    pub async fn deploy(&self, abort: CancellationToken) -> DeploymentReport {
        let started_at = Utc::now();
        self.board.reset();
        let scheduler = StageScheduler::new(
            self.registry.clone(),
            self.hooks.clone(),
            ProbeRunner::new(self.prober.clone(), Instant::now()),
            self.board.clone(),
        );

        tracing::info!(
            platform = %self.config.platform,
            services = self.registry.len(),
            tiers = self.registry.tier_count(),
            "deployment started"
        );

        let run = scheduler.run(&abort).await;

        let mut diag = Diagnostics::default();
        if run.aborted {
            tracing::warn!("deployment aborted");
            if self.stop_on_abort {
                self.stop_all(run.started.iter().rev(), &mut diag).await;
            }
        }

        let report = build_report(
            run.outcomes,
            RunInfo {
                platform: self.config.platform.clone(),
                quorum: self.config.quorum,
                started_at,
                finished_at: Utc::now(),
                aborted: run.aborted,
                warnings: diag.into_messages(),
            },
        );

        tracing::info!(verdict = %report.verdict, passed = report.passed, "deployment finished");
        self.board.publish(report.clone());
        report
    }

    /// Stop every service, last tier first. Failures are collected, never fatal.
    pub async fn teardown(&self) -> Diagnostics {
        let mut diag = Diagnostics::default();
        let order: Vec<&ServiceName> = self
            .registry
            .tiers()
            .into_iter()
            .rev()
            .flat_map(|tier| tier.into_iter().map(|s| &s.name))
            .collect();
        self.stop_all(order.into_iter(), &mut diag).await;
        diag
    }

    async fn stop_all<'a>(
        &self,
        services: impl Iterator<Item = &'a ServiceName>,
        diag: &mut Diagnostics,
    ) {
        for service in services {
            tracing::info!(%service, "stopping service");
            if let Err(e) = self.hooks.stop(service).await {
                diag.warn(Warning::stop_failed(e.to_string()));
            }
        }
    }
}
