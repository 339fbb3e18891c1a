// ABOUTME: Registry loading and validation errors.
// ABOUTME: Any ConfigError aborts the run before a service is touched.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::types::ServiceName;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found in {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("registry must define at least one service")]
    NoServices,

    #[error("duplicate service name: {0}")]
    DuplicateName(ServiceName),

    #[error("service {service}: tier must be non-negative, got {tier}")]
    NegativeTier { service: ServiceName, tier: i64 },

    #[error("service {service}: tier {tier} is out of range")]
    TierTooLarge { service: ServiceName, tier: i64 },

    #[error("tiers must form a contiguous range starting at 0: tier {0} has no services")]
    TierGap(u64),

    #[error("service {0}: timeout must be greater than zero")]
    NonPositiveTimeout(ServiceName),

    #[error("service {0}: interval must be greater than zero")]
    NonPositiveInterval(ServiceName),

    #[error("service {service}: interval ({interval:?}) exceeds timeout ({timeout:?})")]
    IntervalExceedsTimeout {
        service: ServiceName,
        interval: Duration,
        timeout: Duration,
    },

    #[error("service {service}: probe timeout must be between zero and the interval ({interval:?})")]
    InvalidAttemptTimeout {
        service: ServiceName,
        interval: Duration,
    },

    #[error("hooks.{0} must contain at least one argument")]
    EmptyHookCommand(&'static str),

    #[error("quorum must be in (0, 1], got {0}")]
    InvalidQuorum(f64),

    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),
}
