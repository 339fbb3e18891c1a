// ABOUTME: Diagnostics accumulator for non-fatal warnings during a run.
// ABOUTME: Collects stop-hook and lifecycle-hook failures that shouldn't fail a deployment.

/// Collects non-fatal warnings during deployment operations.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// Record a warning, auto-logging it via tracing.
    pub fn warn(&mut self, warning: Warning) {
        tracing::warn!("{}", warning.message);
        self.warnings.push(warning);
    }

    /// Get all collected warnings.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    /// Check if any warnings were collected.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Warning messages in the order they were recorded.
    pub fn into_messages(self) -> Vec<String> {
        self.warnings.into_iter().map(|w| w.message).collect()
    }
}

/// A non-fatal warning collected during deployment.
#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    /// A service's stop hook failed.
    pub fn stop_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::StopFailed,
            message: message.into(),
        }
    }

    /// A post-deploy or on-error hook failed.
    pub fn hook_failed(message: impl Into<String>) -> Self {
        Self {
            kind: WarningKind::HookFailed,
            message: message.into(),
        }
    }
}

/// Categories of warnings that can occur during deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    /// Stop hook rejected or failed; the service may still be running.
    StopFailed,
    /// Non-fatal lifecycle hook failed.
    HookFailed,
}
