// ABOUTME: Start/stop command templates from the registry file.
// ABOUTME: Each argv may contain a {service} placeholder substituted per service.

use serde::Deserialize;

use super::deserialize::deserialize_argv_option;
use super::error::ConfigError;

pub const SERVICE_PLACEHOLDER: &str = "{service}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HooksConfig {
    #[serde(default, deserialize_with = "deserialize_argv_option")]
    pub start: Option<Vec<String>>,

    #[serde(default, deserialize_with = "deserialize_argv_option")]
    pub stop: Option<Vec<String>>,
}

impl HooksConfig {
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.start.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::EmptyHookCommand("start"));
        }
        if self.stop.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigError::EmptyHookCommand("stop"));
        }
        Ok(())
    }
}

/// Substitute the service name into an argv template.
pub fn render_argv(template: &[String], service: &str) -> Vec<String> {
    template
        .iter()
        .map(|arg| arg.replace(SERVICE_PLACEHOLDER, service))
        .collect()
}
