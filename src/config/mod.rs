// ABOUTME: Registry file types and parsing for muster.yml.
// ABOUTME: Handles YAML parsing, discovery, and validation into an explicit Config.

mod deserialize;
mod error;
mod hooks;
mod init;
mod probe;
mod service;

pub use error::ConfigError;
pub use hooks::{HooksConfig, SERVICE_PLACEHOLDER, render_argv};
pub use init::init_config;
pub use probe::{ProbeCheck, ProbeSpec};
pub use service::{Registry, ServiceEntry, ServiceSpec};

use crate::report::QuorumPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILENAME: &str = "muster.yml";
pub const CONFIG_FILENAME_ALT: &str = "muster.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".muster/config.yml";
pub const DEFAULT_HOOKS_DIR: &str = ".muster/hooks";

/// The registry file as written on disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default = "default_platform")]
    platform: String,

    #[serde(default = "default_quorum")]
    quorum: f64,

    #[serde(default)]
    hooks: Option<HooksConfig>,

    #[serde(default)]
    hooks_dir: Option<PathBuf>,

    #[serde(default)]
    services: Vec<ServiceEntry>,
}

fn default_platform() -> String {
    "muster".to_string()
}

fn default_quorum() -> f64 {
    1.0
}

/// Everything a deployment run needs, validated and owned.
#[derive(Debug, Clone)]
pub struct Config {
    pub platform: String,
    pub quorum: QuorumPolicy,
    pub hooks: HooksConfig,
    pub hooks_dir: PathBuf,
    pub registry: Registry,
    /// File the config was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl Config {
    pub fn new(platform: impl Into<String>, registry: Registry) -> Self {
        Self {
            platform: platform.into(),
            quorum: QuorumPolicy::default(),
            hooks: HooksConfig::default(),
            hooks_dir: PathBuf::from(DEFAULT_HOOKS_DIR),
            registry,
            source: None,
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;

        let quorum = QuorumPolicy::new(raw.quorum)?;
        let hooks = raw.hooks.unwrap_or_default();
        hooks.validate()?;
        let registry = Registry::from_entries(raw.services)?;

        Ok(Self {
            platform: raw.platform,
            quorum,
            hooks,
            hooks_dir: raw
                .hooks_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_HOOKS_DIR)),
            registry,
            source: None,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_yaml(&content)?;

        // Relative hook directories resolve against the registry file.
        if config.hooks_dir.is_relative()
            && let Some(base) = config_base_dir(path)
        {
            config.hooks_dir = base.join(&config.hooks_dir);
        }
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(ConfigError::NotFound(dir.to_path_buf()))
    }

    /// Load from an explicit path, or discover in `dir`.
    pub fn resolve(explicit: Option<&Path>, dir: &Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::discover(dir),
        }
    }

    pub fn with_quorum(mut self, quorum: QuorumPolicy) -> Self {
        self.quorum = quorum;
        self
    }
}

/// Project directory for a config file; `.muster/config.yml` belongs to the
/// directory above `.muster`.
fn config_base_dir(path: &Path) -> Option<PathBuf> {
    let parent = path.parent()?;
    if parent.file_name().is_some_and(|n| n == ".muster") {
        return parent.parent().map(Path::to_path_buf);
    }
    Some(parent.to_path_buf())
}
