// ABOUTME: Down command implementation.
// ABOUTME: Runs the stop hook for every service, last tier first.

use muster::config::Config;
use muster::deploy::Deployer;
use muster::error::Result;
use muster::output::Output;
use std::path::Path;

/// Returns the exit code: 1 if any stop hook failed.
pub async fn down(cwd: &Path, config_path: Option<&Path>, mut output: Output) -> Result<i32> {
    let config = Config::resolve(config_path, cwd)?;
    output.start_timer();
    output.progress(&format!(
        "Stopping {} service(s) of {}",
        config.registry.len(),
        config.platform
    ));

    let deployer = Deployer::from_config(config);
    let diag = deployer.teardown().await;

    for warning in diag.warnings() {
        output.warning(&warning.message);
    }

    if diag.has_warnings() {
        output.error("some services failed to stop");
        Ok(1)
    } else {
        output.success("All services stopped");
        Ok(0)
    }
}
