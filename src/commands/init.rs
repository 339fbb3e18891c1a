// ABOUTME: Init command implementation.
// ABOUTME: Scaffolds a muster.yml registry in the working directory.

use muster::config;
use muster::error::Result;
use muster::output::Output;
use std::path::Path;

pub fn init(cwd: &Path, platform: Option<&str>, force: bool, output: Output) -> Result<()> {
    let path = config::init_config(cwd, platform, force)?;
    output.success(&format!("Created {}", path.display()));
    Ok(())
}
