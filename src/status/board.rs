// ABOUTME: Live, shared view of service states for the status endpoint.
// ABOUTME: Written by probe tasks as they progress, read by the HTTP server.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::Registry;
use crate::deploy::ServiceStatus;
use crate::report::{DeploymentReport, Verdict};

/// Where a service currently is in its wait loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LiveState {
    Pending,
    Starting,
    Probing,
    Ready,
    TimedOut,
    Errored,
}

impl From<ServiceStatus> for LiveState {
    fn from(status: ServiceStatus) -> Self {
        match status {
            ServiceStatus::Ready => LiveState::Ready,
            ServiceStatus::TimedOut => LiveState::TimedOut,
            ServiceStatus::Errored => LiveState::Errored,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    address: String,
    state: LiveState,
}

#[derive(Debug, Default)]
struct Inner {
    platform: String,
    services: BTreeMap<String, Entry>,
    report: Option<Arc<DeploymentReport>>,
}

/// Shape consumed by the dashboards: `{status, platform, timestamp, services}`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: &'static str,
    pub platform: String,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, String>,
    pub states: BTreeMap<String, LiveState>,
}

/// Cheaply cloneable handle to the shared service map.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    inner: Arc<RwLock<Inner>>,
}

impl StatusBoard {
    pub fn new(platform: impl Into<String>, registry: &Registry) -> Self {
        let services = registry
            .services()
            .map(|s| {
                (
                    s.name.to_string(),
                    Entry {
                        address: s.address(),
                        state: LiveState::Pending,
                    },
                )
            })
            .collect();

        Self {
            inner: Arc::new(RwLock::new(Inner {
                platform: platform.into(),
                services,
                report: None,
            })),
        }
    }

    pub fn set_state(&self, service: &str, state: LiveState) {
        if let Some(entry) = self.inner.write().services.get_mut(service) {
            entry.state = state;
        }
    }

    pub fn state(&self, service: &str) -> Option<LiveState> {
        self.inner.read().services.get(service).map(|e| e.state)
    }

    /// Publish the final report; the board's states follow it.
    pub fn publish(&self, report: DeploymentReport) {
        let mut inner = self.inner.write();
        for outcome in &report.services {
            if let Some(entry) = inner.services.get_mut(outcome.service.as_str()) {
                entry.state = outcome.status.into();
            }
        }
        inner.report = Some(Arc::new(report));
    }

    /// Forget the previous run: every service back to Pending, no report.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        for entry in inner.services.values_mut() {
            entry.state = LiveState::Pending;
        }
        inner.report = None;
    }

    pub fn report(&self) -> Option<Arc<DeploymentReport>> {
        self.inner.read().report.clone()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.inner.read();

        let status = match &inner.report {
            None => "deploying",
            Some(report) if report.passed && report.verdict == Verdict::AllReady => "operational",
            Some(report) => match report.verdict {
                Verdict::Failed => "failed",
                _ => "degraded",
            },
        };

        StatusSnapshot {
            status,
            platform: inner.platform.clone(),
            timestamp: Utc::now(),
            services: inner
                .services
                .iter()
                .map(|(name, e)| (name.clone(), e.address.clone()))
                .collect(),
            states: inner
                .services
                .iter()
                .map(|(name, e)| (name.clone(), e.state))
                .collect(),
        }
    }
}
