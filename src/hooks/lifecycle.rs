// ABOUTME: Lifecycle hooks around a deployment run.
// ABOUTME: Discovers and executes scripts at pre-deploy, post-deploy, and on-error points.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::diagnostics::{Diagnostics, Warning};
use crate::error::{Error, Result};
use crate::report::DeploymentReport;

/// Hook execution points in the deployment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookPoint {
    /// Before any service is started. Failure aborts the run.
    PreDeploy,
    /// After a passing report. Failure logs a warning.
    PostDeploy,
    /// After a failing report. Failure logs a warning.
    OnError,
}

impl HookPoint {
    /// Get the hook filename for this point.
    pub fn filename(&self) -> &'static str {
        match self {
            HookPoint::PreDeploy => "pre-deploy",
            HookPoint::PostDeploy => "post-deploy",
            HookPoint::OnError => "on-error",
        }
    }

    /// Whether failure at this hook point should abort deployment.
    pub fn is_fatal(&self) -> bool {
        matches!(self, HookPoint::PreDeploy)
    }
}

/// Context passed to hooks via environment variables.
#[derive(Debug, Clone)]
pub struct HookContext {
    pub platform: String,
    pub config_path: Option<PathBuf>,
    pub verdict: Option<String>,
    pub ready: Option<usize>,
    pub total: Option<usize>,
}

impl HookContext {
    pub fn new(platform: impl Into<String>, config_path: Option<&Path>) -> Self {
        Self {
            platform: platform.into(),
            config_path: config_path.map(Path::to_path_buf),
            verdict: None,
            ready: None,
            total: None,
        }
    }

    /// Attach the outcome of a finished run.
    pub fn with_report(mut self, report: &DeploymentReport) -> Self {
        self.verdict = Some(report.verdict.label().to_string());
        self.ready = Some(report.ready_count());
        self.total = Some(report.total_count());
        self
    }

    /// Convert context to environment variables.
    pub fn to_env(&self) -> HashMap<String, String> {
        let mut env = HashMap::new();
        env.insert("MUSTER_PLATFORM".to_string(), self.platform.clone());
        if let Some(ref path) = self.config_path {
            env.insert("MUSTER_CONFIG".to_string(), path.display().to_string());
        }
        if let Some(ref verdict) = self.verdict {
            env.insert("MUSTER_VERDICT".to_string(), verdict.clone());
        }
        if let Some(ready) = self.ready {
            env.insert("MUSTER_READY".to_string(), ready.to_string());
        }
        if let Some(total) = self.total {
            env.insert("MUSTER_TOTAL".to_string(), total.to_string());
        }
        env
    }
}

/// Result of running a hook.
#[derive(Debug)]
pub struct HookResult {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl HookResult {
    fn launch_failed(error: std::io::Error) -> Self {
        Self {
            success: false,
            exit_code: None,
            stdout: String::new(),
            stderr: error.to_string(),
        }
    }

    /// One-line description of a failed hook for warnings and errors.
    fn failure(&self, point: HookPoint) -> String {
        let status = match self.exit_code {
            Some(code) => format!("exit code {code}"),
            None => "no exit code".to_string(),
        };
        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{} hook failed ({status}): {}", point.filename(), line.trim()),
            None => format!("{} hook failed ({status})", point.filename()),
        }
    }
}

impl From<std::process::Output> for HookResult {
    fn from(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// Discovers and runs hook scripts from one directory.
pub struct HookRunner {
    hooks_dir: PathBuf,
}

impl HookRunner {
    pub fn new(hooks_dir: &Path) -> Self {
        Self {
            hooks_dir: hooks_dir.to_path_buf(),
        }
    }

    fn hook_path(&self, point: HookPoint) -> PathBuf {
        self.hooks_dir.join(point.filename())
    }

    /// Run the script for `point`. `None` when there is no script.
    pub async fn run(&self, point: HookPoint, context: &HookContext) -> Option<HookResult> {
        let hook_path = self.hook_path(point);
        if !hook_path.is_file() {
            tracing::debug!(hook = point.filename(), "no hook script");
            return None;
        }

        tracing::info!(hook = point.filename(), path = %hook_path.display(), "running lifecycle hook");

        let result = Command::new(&hook_path)
            .envs(context.to_env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_or_else(HookResult::launch_failed, HookResult::from);

        tracing::debug!(
            hook = point.filename(),
            success = result.success,
            exit_code = ?result.exit_code,
            "lifecycle hook finished"
        );
        Some(result)
    }

    /// Run the script for `point` and apply its failure policy.
    ///
    /// A failing fatal hook is returned as an error. Other failures are
    /// recorded in `diag` and the run carries on.
    pub async fn run_checked(
        &self,
        point: HookPoint,
        context: &HookContext,
        diag: &mut Diagnostics,
    ) -> Result<()> {
        let Some(result) = self.run(point, context).await else {
            return Ok(());
        };
        if result.success {
            return Ok(());
        }

        let message = result.failure(point);
        if point.is_fatal() {
            Err(Error::Hook(message))
        } else {
            diag.warn(Warning::hook_failed(message));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_point_filenames() {
        assert_eq!(HookPoint::PreDeploy.filename(), "pre-deploy");
        assert_eq!(HookPoint::PostDeploy.filename(), "post-deploy");
        assert_eq!(HookPoint::OnError.filename(), "on-error");
    }

    #[test]
    fn only_pre_deploy_is_fatal() {
        assert!(HookPoint::PreDeploy.is_fatal());
        assert!(!HookPoint::PostDeploy.is_fatal());
        assert!(!HookPoint::OnError.is_fatal());
    }

    #[test]
    fn context_without_report() {
        let context = HookContext::new("soc", Some(Path::new("/srv/soc/muster.yml")));
        let env = context.to_env();
        assert_eq!(env.get("MUSTER_PLATFORM"), Some(&"soc".to_string()));
        assert_eq!(
            env.get("MUSTER_CONFIG"),
            Some(&"/srv/soc/muster.yml".to_string())
        );
        assert!(!env.contains_key("MUSTER_VERDICT"));
        assert!(!env.contains_key("MUSTER_READY"));
    }

    #[tokio::test]
    async fn missing_hooks_dir_has_no_hooks() {
        let runner = HookRunner::new(Path::new("/nonexistent"));
        let context = HookContext::new("soc", None);
        let mut diag = Diagnostics::default();

        assert!(runner.run(HookPoint::PreDeploy, &context).await.is_none());
        assert!(
            runner
                .run_checked(HookPoint::PreDeploy, &context, &mut diag)
                .await
                .is_ok()
        );
        assert!(!diag.has_warnings());
    }

    #[test]
    fn failure_message_uses_last_stderr_line() {
        let result = HookResult {
            success: false,
            exit_code: Some(2),
            stdout: String::new(),
            stderr: "checking disk\nno space left\n\n".to_string(),
        };
        assert_eq!(
            result.failure(HookPoint::OnError),
            "on-error hook failed (exit code 2): no space left"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_executable_hook_with_env() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pre-deploy");
        std::fs::write(&path, "#!/bin/sh\necho \"provisioning $MUSTER_PLATFORM\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = HookRunner::new(dir.path());
        let result = runner
            .run(HookPoint::PreDeploy, &HookContext::new("soc", None))
            .await
            .expect("hook should run");

        assert!(result.success);
        assert_eq!(result.stdout.trim(), "provisioning soc");
        assert!(runner.run(HookPoint::OnError, &HookContext::new("soc", None)).await.is_none());
    }
}
