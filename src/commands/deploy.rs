// ABOUTME: Deploy command implementation.
// ABOUTME: Wires lifecycle hooks, abort signals, and the status server around a run.

use muster::config::Config;
use muster::deploy::Deployer;
use muster::diagnostics::Diagnostics;
use muster::error::{Error, Result};
use muster::hooks::{HookContext, HookPoint, HookRunner};
use muster::output::Output;
use muster::report::QuorumPolicy;
use muster::status::StatusServer;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct DeployOptions {
    pub config: Option<PathBuf>,
    pub abort_timeout: Option<Duration>,
    pub dry_run: bool,
    pub quorum: Option<f64>,
    pub serve: Option<SocketAddr>,
    pub stop_on_abort: bool,
}

/// Run one deployment pass. Returns the exit code derived from the report.
pub async fn deploy(cwd: &Path, options: DeployOptions, mut output: Output) -> Result<i32> {
    let mut config = Config::resolve(options.config.as_deref(), cwd)?;
    if let Some(threshold) = options.quorum {
        config = config.with_quorum(QuorumPolicy::new(threshold)?);
    }

    let deployer = Deployer::from_config(config).stop_on_abort(options.stop_on_abort);
    let config = deployer.config();

    if options.dry_run {
        output.plan(&config.platform, &deployer.plan());
        return Ok(0);
    }

    output.start_timer();
    let hook_runner = HookRunner::new(&config.hooks_dir);
    let context = HookContext::new(&config.platform, config.source.as_deref());

    let mut diag = Diagnostics::default();

    hook_runner
        .run_checked(HookPoint::PreDeploy, &context, &mut diag)
        .await?;

    let shutdown = CancellationToken::new();
    let server = match options.serve {
        Some(addr) => {
            let server = StatusServer::bind(addr)
                .await
                .map_err(|e| Error::Server(format!("failed to bind {addr}: {e}")))?;
            output.progress(&format!(
                "Status endpoint listening on http://{}",
                server.local_addr()?
            ));
            Some(tokio::spawn(server.run(deployer.board(), shutdown.clone())))
        }
        None => None,
    };

    output.progress(&format!(
        "Deploying {} ({} service(s) in {} tier(s))",
        config.platform,
        config.registry.len(),
        config.registry.tier_count()
    ));

    let abort = CancellationToken::new();
    let watcher = tokio::spawn(abort_on_signal(abort.clone(), options.abort_timeout));
    let report = deployer.deploy(abort).await;
    watcher.abort();

    let point = if report.passed {
        HookPoint::PostDeploy
    } else {
        HookPoint::OnError
    };
    let context = context.with_report(&report);
    hook_runner.run_checked(point, &context, &mut diag).await?;

    output.report(&report);
    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    if let Some(handle) = server {
        output.progress("Serving status until Ctrl-C");
        tokio::signal::ctrl_c().await?;
        shutdown.cancel();
        if let Err(e) = handle.await {
            tracing::warn!("status server task failed: {}", e);
        }
    }

    Ok(report.exit_code())
}

/// Cancel `abort` on Ctrl-C or once `timeout` elapses.
async fn abort_on_signal(abort: CancellationToken, timeout: Option<Duration>) {
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => tracing::warn!("interrupt received, aborting deployment"),
        _ = deadline => tracing::warn!("abort timeout elapsed, aborting deployment"),
    }
    abort.cancel();
}
