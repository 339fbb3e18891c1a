// ABOUTME: Start/stop actions the deployer invokes per service.
// ABOUTME: CommandHooks runs configured argv templates; NoopHooks leaves services to someone else.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

use crate::config::{HooksConfig, render_argv};
use crate::types::ServiceName;

/// Errors from a start hook. Recorded against the service, never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartError {
    #[error("failed to launch start command for {service}: {message}")]
    Launch { service: ServiceName, message: String },

    #[error("start command for {service} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        service: ServiceName,
        status: String,
        stderr: String,
    },

    #[error("start of {service} rejected: {message}")]
    Rejected { service: ServiceName, message: String },
}

/// Errors from a stop hook. Reported as warnings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopError {
    #[error("failed to launch stop command for {service}: {message}")]
    Launch { service: ServiceName, message: String },

    #[error("stop command for {service} exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        service: ServiceName,
        status: String,
        stderr: String,
    },

    #[error("stop of {service} rejected: {message}")]
    Rejected { service: ServiceName, message: String },
}

fn stderr_suffix(stderr: &str) -> String {
    match stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => format!(": {}", line.trim()),
        None => String::new(),
    }
}

/// How services are actually started and stopped.
///
/// The scheduler treats `start` as fire-and-forget: returning `Ok` only means
/// the request was accepted, readiness is established by probing.
#[async_trait]
pub trait ServiceHooks: Send + Sync {
    async fn start(&self, service: &ServiceName) -> Result<(), StartError>;

    async fn stop(&self, service: &ServiceName) -> Result<(), StopError>;
}

/// Services are managed outside muster; only probe them.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

#[async_trait]
impl ServiceHooks for NoopHooks {
    async fn start(&self, service: &ServiceName) -> Result<(), StartError> {
        tracing::debug!(%service, "no start command configured");
        Ok(())
    }

    async fn stop(&self, service: &ServiceName) -> Result<(), StopError> {
        tracing::debug!(%service, "no stop command configured");
        Ok(())
    }
}

/// Runs argv templates such as `docker compose up -d {service}`.
#[derive(Debug, Clone)]
pub struct CommandHooks {
    start: Option<Vec<String>>,
    stop: Option<Vec<String>>,
    platform: String,
}

/// What a finished hook process reported.
struct CommandOutput {
    success: bool,
    status: String,
    stderr: String,
}

impl CommandHooks {
    pub fn new(config: &HooksConfig, platform: impl Into<String>) -> Self {
        Self {
            start: config.start.clone(),
            stop: config.stop.clone(),
            platform: platform.into(),
        }
    }

    async fn run(&self, template: &[String], service: &ServiceName) -> std::io::Result<CommandOutput> {
        let argv = render_argv(template, service.as_str());
        // Validated non-empty at config load.
        let Some((program, args)) = argv.split_first() else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "empty command",
            ));
        };

        tracing::info!(%service, command = %argv.join(" "), "running service hook");

        let output = Command::new(program)
            .args(args)
            .env("MUSTER_SERVICE", service.as_str())
            .env("MUSTER_PLATFORM", &self.platform)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // An aborted deployment drops the hook mid-flight.
            .kill_on_drop(true)
            .output()
            .await?;

        let status = match output.status.code() {
            Some(code) => format!("exit code {code}"),
            None => "a signal".to_string(),
        };

        Ok(CommandOutput {
            success: output.status.success(),
            status,
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[async_trait]
impl ServiceHooks for CommandHooks {
    async fn start(&self, service: &ServiceName) -> Result<(), StartError> {
        let Some(template) = &self.start else {
            return Ok(());
        };

        let output = self
            .run(template, service)
            .await
            .map_err(|e| StartError::Launch {
                service: service.clone(),
                message: e.to_string(),
            })?;

        if output.success {
            Ok(())
        } else {
            tracing::warn!(%service, status = %output.status, "start command failed");
            Err(StartError::Failed {
                service: service.clone(),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }

    async fn stop(&self, service: &ServiceName) -> Result<(), StopError> {
        let Some(template) = &self.stop else {
            return Ok(());
        };

        let output = self
            .run(template, service)
            .await
            .map_err(|e| StopError::Launch {
                service: service.clone(),
                message: e.to_string(),
            })?;

        if output.success {
            Ok(())
        } else {
            tracing::warn!(%service, status = %output.status, "stop command failed");
            Err(StopError::Failed {
                service: service.clone(),
                status: output.status,
                stderr: output.stderr,
            })
        }
    }
}
