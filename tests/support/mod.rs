// ABOUTME: Test support utilities.
// ABOUTME: Provides scripted hooks and probers that record what the deployer did.

use async_trait::async_trait;
use muster::config::{ProbeSpec, Registry, ServiceSpec};
use muster::hooks::{ServiceHooks, StartError, StopError};
use muster::probe::{ProbeError, Prober, Readiness};
use muster::types::ServiceName;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Once};
use std::time::Duration;
use tokio::time::Instant;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env().add_directive("muster=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Ordered log of everything the fakes observed.
#[derive(Debug, Clone, Default)]
pub struct Events(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl Events {
    pub fn push(&self, event: String) {
        self.0.lock().push(event);
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().position(|e| e == event)
    }

    pub fn last_position(&self, event: &str) -> Option<usize> {
        self.0.lock().iter().rposition(|e| e == event)
    }

    pub fn count(&self, event: &str) -> usize {
        self.0.lock().iter().filter(|e| *e == event).count()
    }
}

/// Hooks that log calls and reject the services they are told to.
#[derive(Debug, Clone, Default)]
pub struct FakeHooks {
    pub events: Events,
    pub reject_start: HashSet<String>,
    pub reject_stop: HashSet<String>,
    pub slow_start: HashMap<String, Duration>,
}

#[allow(dead_code)]
impl FakeHooks {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn rejecting_start(mut self, service: &str) -> Self {
        self.reject_start.insert(service.to_string());
        self
    }

    /// Make the start hook take `delay` before it returns.
    pub fn slow_start(mut self, service: &str, delay: Duration) -> Self {
        self.slow_start.insert(service.to_string(), delay);
        self
    }

    pub fn rejecting_stop(mut self, service: &str) -> Self {
        self.reject_stop.insert(service.to_string());
        self
    }
}

#[async_trait]
impl ServiceHooks for FakeHooks {
    async fn start(&self, service: &ServiceName) -> Result<(), StartError> {
        self.events.push(format!("start:{service}"));
        if let Some(delay) = self.slow_start.get(service.as_str()) {
            tokio::time::sleep(*delay).await;
        }
        if self.reject_start.contains(service.as_str()) {
            return Err(StartError::Rejected {
                service: service.clone(),
                message: "image not found".to_string(),
            });
        }
        Ok(())
    }

    async fn stop(&self, service: &ServiceName) -> Result<(), StopError> {
        self.events.push(format!("stop:{service}"));
        if self.reject_stop.contains(service.as_str()) {
            return Err(StopError::Rejected {
                service: service.clone(),
                message: "container busy".to_string(),
            });
        }
        Ok(())
    }
}

/// Prober whose services become ready a fixed time after their own first
/// check, which runs right after the service's start hook.
///
/// Services without an entry never become ready.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProber {
    pub events: Events,
    first_check: Arc<Mutex<HashMap<String, Instant>>>,
    ready_after: HashMap<String, Duration>,
    hang_after: HashMap<String, Duration>,
    broken: HashSet<String>,
}

#[allow(dead_code)]
impl ScriptedProber {
    pub fn new(events: Events) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }

    pub fn ready_after(mut self, service: &str, after: Duration) -> Self {
        self.ready_after.insert(service.to_string(), after);
        self
    }

    pub fn always_ready(self, service: &str) -> Self {
        self.ready_after(service, Duration::ZERO)
    }

    /// Refuse quickly until `after`, then never answer.
    pub fn hanging_after(mut self, service: &str, after: Duration) -> Self {
        self.hang_after.insert(service.to_string(), after);
        self
    }

    /// Fail every check with a hard error, as an unsupported target does.
    pub fn broken(mut self, service: &str) -> Self {
        self.broken.insert(service.to_string());
        self
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn check(&self, service: &ServiceSpec) -> Result<Readiness, ProbeError> {
        let name = service.name.as_str();
        self.events.push(format!("probe:{name}"));

        if self.broken.contains(name) {
            return Err(ProbeError::UnsupportedScheme {
                url: format!("https://{name}:9200"),
            });
        }

        let since_first = {
            let mut first = self.first_check.lock();
            first.entry(name.to_string()).or_insert_with(Instant::now).elapsed()
        };

        if let Some(after) = self.hang_after.get(name)
            && since_first >= *after
        {
            std::future::pending::<()>().await;
        }

        match self.ready_after.get(name) {
            Some(after) if since_first >= *after => Ok(Readiness::Ready),
            _ => Ok(Readiness::NotReady("connection refused".to_string())),
        }
    }
}

#[allow(dead_code)]
pub fn name(s: &str) -> ServiceName {
    ServiceName::new(s).unwrap()
}

/// A service probed over TCP with the given timeout and interval.
#[allow(dead_code)]
pub fn service(n: &str, tier: u32, timeout_secs: u64, interval_secs: u64) -> ServiceSpec {
    ServiceSpec::new(name(n), tier, ProbeSpec::tcp(format!("{n}:9200")))
        .timeout(Duration::from_secs(timeout_secs))
        .interval(Duration::from_secs(interval_secs))
}

#[allow(dead_code)]
pub fn registry(services: Vec<ServiceSpec>) -> Registry {
    Registry::new(services).unwrap()
}
