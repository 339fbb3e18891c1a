// ABOUTME: Validated service identifier used as the registry key.
// ABOUTME: Accepts compose-style names: lowercase alphanumerics plus '-', '_' and '.'.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Borrow;
use std::fmt;
use thiserror::Error;

const MAX_LEN: usize = 63;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceNameError {
    #[error("service name cannot be empty")]
    Empty,

    #[error("service name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("service name must start with a letter or digit")]
    BadStart,

    #[error("service name must end with a letter or digit")]
    BadEnd,

    #[error("service name must be lowercase")]
    NotLowercase,

    #[error("invalid character in service name: '{0}'")]
    InvalidChar(char),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ServiceName(String);

impl ServiceName {
    pub fn new(value: &str) -> Result<Self, ServiceNameError> {
        if value.is_empty() {
            return Err(ServiceNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(ServiceNameError::TooLong);
        }

        for c in value.chars() {
            if c.is_ascii_uppercase() {
                return Err(ServiceNameError::NotLowercase);
            }
            if !c.is_ascii_lowercase() && !c.is_ascii_digit() && !matches!(c, '-' | '_' | '.') {
                return Err(ServiceNameError::InvalidChar(c));
            }
        }

        let is_edge = |c: char| c.is_ascii_lowercase() || c.is_ascii_digit();
        if !value.starts_with(is_edge) {
            return Err(ServiceNameError::BadStart);
        }
        if !value.ends_with(is_edge) {
            return Err(ServiceNameError::BadEnd);
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ServiceName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ServiceName::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_compose_style_names() {
        for name in ["es", "wazuh-manager", "thehive_db", "misp.core", "ollama2"] {
            assert!(ServiceName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_bad_edges() {
        assert_eq!(ServiceName::new("-es"), Err(ServiceNameError::BadStart));
        assert_eq!(ServiceName::new("es."), Err(ServiceNameError::BadEnd));
    }

    #[test]
    fn rejects_uppercase_and_symbols() {
        assert_eq!(ServiceName::new("Kibana"), Err(ServiceNameError::NotLowercase));
        assert_eq!(
            ServiceName::new("kib ana"),
            Err(ServiceNameError::InvalidChar(' '))
        );
    }

    #[test]
    fn rejects_overlong() {
        let name = "a".repeat(MAX_LEN + 1);
        assert_eq!(ServiceName::new(&name), Err(ServiceNameError::TooLong));
    }

    #[test]
    fn deserializes_with_validation() {
        let name: ServiceName = serde_yaml::from_str("kibana").unwrap();
        assert_eq!(name.as_str(), "kibana");
        assert!(serde_yaml::from_str::<ServiceName>("\"\"").is_err());
    }
}
