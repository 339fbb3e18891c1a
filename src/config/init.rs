// ABOUTME: Registry scaffolding for new projects.
// ABOUTME: Writes a muster.yml template describing a small tiered stack.

use std::path::{Path, PathBuf};

use super::{CONFIG_FILENAME, Config, ConfigError};

/// Write a template registry into `dir`, returning its path.
pub fn init_config(dir: &Path, platform: Option<&str>, force: bool) -> Result<PathBuf, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() && !force {
        return Err(ConfigError::AlreadyExists(config_path));
    }

    let yaml = generate_template_yaml(platform.unwrap_or("soc-platform"));

    // The template must always load; catch drift between it and the parser.
    Config::from_yaml(&yaml)?;

    std::fs::write(&config_path, yaml).map_err(|source| ConfigError::Write {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

fn generate_template_yaml(platform: &str) -> String {
    format!(
        r#"platform: {platform}

# Fraction of services that must be ready for the deployment to pass.
quorum: 1.0

# Commands used to start and stop a service. {{service}} is replaced by the name.
# Leave out to probe services that are managed elsewhere.
hooks:
  start: docker compose up -d {{service}}
  stop: docker compose stop {{service}}

services:
  - name: elasticsearch
    tier: 0
    probe:
      type: http
      url: http://localhost:9200
    timeout: 2m
    interval: 5s

  - name: kibana
    tier: 1
    probe:
      type: http
      url: http://localhost:5601/api/status
    timeout: 2m
    interval: 5s

  - name: wazuh-manager
    tier: 1
    probe:
      type: tcp
      address: localhost:55000
    timeout: 90s
    interval: 5s
"#
    )
}
