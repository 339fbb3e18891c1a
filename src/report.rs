// ABOUTME: Aggregates service outcomes into the deployment report and verdict.
// ABOUTME: The quorum policy decides whether a partially ready deployment still passes.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::config::ConfigError;
use crate::deploy::{ServiceOutcome, ServiceStatus};

/// Overall result of a deployment run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    AllReady,
    PartialReady { ready: usize, total: usize },
    Failed,
}

impl Verdict {
    /// Classify `ready` out of `total` services.
    pub fn classify(ready: usize, total: usize) -> Self {
        if total > 0 && ready == total {
            Verdict::AllReady
        } else if ready == 0 {
            Verdict::Failed
        } else {
            Verdict::PartialReady { ready, total }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Verdict::AllReady => "all_ready",
            Verdict::PartialReady { .. } => "partial_ready",
            Verdict::Failed => "failed",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::AllReady => write!(f, "all services ready"),
            Verdict::PartialReady { ready, total } => {
                write!(f, "{ready}/{total} services ready")
            }
            Verdict::Failed => write!(f, "no services ready"),
        }
    }
}

/// Minimum fraction of ready services accepted as a successful deployment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuorumPolicy {
    threshold: f64,
}

impl QuorumPolicy {
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if threshold.is_finite() && threshold > 0.0 && threshold <= 1.0 {
            Ok(Self { threshold })
        } else {
            Err(ConfigError::InvalidQuorum(threshold))
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn passes(&self, report: &DeploymentReport) -> bool {
        match report.verdict {
            Verdict::AllReady => true,
            Verdict::PartialReady { .. } => report.ready_fraction() >= self.threshold,
            Verdict::Failed => false,
        }
    }
}

impl Default for QuorumPolicy {
    fn default() -> Self {
        Self { threshold: 1.0 }
    }
}

impl Serialize for QuorumPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.threshold)
    }
}

/// Everything known about one deployment run. Built once, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub platform: String,
    #[serde(flatten)]
    pub verdict: Verdict,
    pub ready_fraction: f64,
    pub quorum: QuorumPolicy,
    pub passed: bool,
    pub aborted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub services: Vec<ServiceOutcome>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DeploymentReport {
    pub fn ready_count(&self) -> usize {
        self.services.iter().filter(|s| s.is_ready()).count()
    }

    pub fn total_count(&self) -> usize {
        self.services.len()
    }

    pub fn ready_fraction(&self) -> f64 {
        fraction(self.ready_count(), self.total_count())
    }

    pub fn outcome(&self, service: &str) -> Option<&ServiceOutcome> {
        self.services.iter().find(|s| s.service.as_str() == service)
    }

    pub fn status_of(&self, service: &str) -> Option<ServiceStatus> {
        self.outcome(service).map(|o| o.status)
    }

    /// Process exit code for this report: 0 if it passes the quorum, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        if self.passed { 0 } else { 1 }
    }
}

fn fraction(ready: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        ready as f64 / total as f64
    }
}

/// Inputs for [`build_report`] that are not outcomes.
#[derive(Debug, Clone)]
pub struct RunInfo {
    pub platform: String,
    pub quorum: QuorumPolicy,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub aborted: bool,
    pub warnings: Vec<String>,
}

/// Aggregate outcomes into a report. Pure: no I/O, no clock reads.
///
/// Outcomes are ordered by tier, then by their position in `outcomes`.
pub fn build_report(mut outcomes: Vec<ServiceOutcome>, info: RunInfo) -> DeploymentReport {
    outcomes.sort_by_key(|o| o.tier);

    let total = outcomes.len();
    let ready = outcomes.iter().filter(|o| o.is_ready()).count();
    let verdict = Verdict::classify(ready, total);

    let mut report = DeploymentReport {
        platform: info.platform,
        verdict,
        ready_fraction: fraction(ready, total),
        quorum: info.quorum,
        passed: false,
        aborted: info.aborted,
        started_at: info.started_at,
        finished_at: info.finished_at,
        services: outcomes,
        warnings: info.warnings,
    };
    report.passed = !report.aborted && info.quorum.passes(&report);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceName;

    fn outcome(name: &str, tier: u32, status: ServiceStatus) -> ServiceOutcome {
        ServiceOutcome {
            service: ServiceName::new(name).unwrap(),
            tier,
            status,
            attempts: Vec::new(),
            total_elapsed_ms: 0,
            reason: (status != ServiceStatus::Ready).then(|| "nope".to_string()),
        }
    }

    fn info(quorum: f64) -> RunInfo {
        RunInfo {
            platform: "soc".to_string(),
            quorum: QuorumPolicy::new(quorum).unwrap(),
            started_at: Utc::now(),
            finished_at: Utc::now(),
            aborted: false,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn classify_edges() {
        assert_eq!(Verdict::classify(3, 3), Verdict::AllReady);
        assert_eq!(Verdict::classify(0, 3), Verdict::Failed);
        assert_eq!(Verdict::classify(0, 0), Verdict::Failed);
        assert_eq!(
            Verdict::classify(2, 3),
            Verdict::PartialReady { ready: 2, total: 3 }
        );
    }

    #[test]
    fn three_of_four_meets_75_percent_quorum() {
        let outcomes = vec![
            outcome("es", 0, ServiceStatus::Ready),
            outcome("kibana", 1, ServiceStatus::Ready),
            outcome("wazuh", 1, ServiceStatus::Ready),
            outcome("misp", 1, ServiceStatus::TimedOut),
        ];
        let report = build_report(outcomes.clone(), info(0.75));
        assert_eq!(report.verdict, Verdict::PartialReady { ready: 3, total: 4 });
        assert!(report.passed);
        assert_eq!(report.exit_code(), 0);

        let strict = build_report(outcomes, info(1.0));
        assert!(!strict.passed);
        assert_eq!(strict.exit_code(), 1);
    }

    #[test]
    fn failed_never_passes() {
        let report = build_report(vec![outcome("es", 0, ServiceStatus::Errored)], info(0.01));
        assert_eq!(report.verdict, Verdict::Failed);
        assert!(!report.passed);
    }

    #[test]
    fn aborted_run_never_passes() {
        let mut run = info(0.5);
        run.aborted = true;
        let report = build_report(
            vec![
                outcome("es", 0, ServiceStatus::Ready),
                outcome("kibana", 1, ServiceStatus::Errored),
            ],
            run,
        );
        assert!(!report.passed);
    }

    #[test]
    fn sorts_by_tier() {
        let report = build_report(
            vec![
                outcome("kibana", 1, ServiceStatus::Ready),
                outcome("es", 0, ServiceStatus::Ready),
            ],
            info(1.0),
        );
        assert_eq!(report.services[0].service.as_str(), "es");
        assert_eq!(report.status_of("kibana"), Some(ServiceStatus::Ready));
    }

    #[test]
    fn quorum_bounds() {
        assert!(QuorumPolicy::new(0.0).is_err());
        assert!(QuorumPolicy::new(1.5).is_err());
        assert!(QuorumPolicy::new(f64::NAN).is_err());
        assert!(QuorumPolicy::new(1.0).is_ok());
    }

    #[test]
    fn serializes_verdict_inline() {
        let report = build_report(
            vec![
                outcome("es", 0, ServiceStatus::Ready),
                outcome("kibana", 1, ServiceStatus::TimedOut),
            ],
            info(1.0),
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["verdict"], "partial_ready");
        assert_eq!(json["ready"], 1);
        assert_eq!(json["total"], 2);
        assert_eq!(json["services"][1]["status"], "timed_out");
    }
}
