// ABOUTME: Readiness probe descriptors for registry entries.
// ABOUTME: HTTP status, TCP connect, and process exit-code checks.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::deserialize::deserialize_argv;

/// How to check whether a service is ready.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ProbeSpec {
    #[serde(flatten)]
    pub check: ProbeCheck,

    /// Per-attempt timeout. Defaults to the service's poll interval.
    #[serde(default, with = "humantime_serde", skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProbeCheck {
    /// GET the URL; ready when the status matches `expect_status` (any 2xx if empty).
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        expect_status: Vec<u16>,
    },
    /// Ready when a TCP connection to `host:port` succeeds.
    Tcp { address: String },
    /// Ready when the command exits with status zero.
    Exec {
        #[serde(deserialize_with = "deserialize_argv")]
        command: Vec<String>,
    },
}

impl ProbeSpec {
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            check: ProbeCheck::Http {
                url: url.into(),
                expect_status: Vec::new(),
            },
            timeout: None,
        }
    }

    pub fn tcp(address: impl Into<String>) -> Self {
        Self {
            check: ProbeCheck::Tcp {
                address: address.into(),
            },
            timeout: None,
        }
    }

    pub fn exec<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            check: ProbeCheck::Exec {
                command: command.into_iter().map(Into::into).collect(),
            },
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Human-readable target, used as the advertised address.
    pub fn target(&self) -> String {
        match &self.check {
            ProbeCheck::Http { url, .. } => url.clone(),
            ProbeCheck::Tcp { address } => address.clone(),
            ProbeCheck::Exec { command } => command.join(" "),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self.check {
            ProbeCheck::Http { .. } => "http",
            ProbeCheck::Tcp { .. } => "tcp",
            ProbeCheck::Exec { .. } => "exec",
        }
    }
}
