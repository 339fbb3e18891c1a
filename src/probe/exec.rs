// ABOUTME: Process exit-code readiness check.
// ABOUTME: Runs the probe command directly (no shell) and kills it if the attempt is dropped.

use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;

use super::Readiness;
use super::error::{CommandNotFoundSnafu, EmptyCommandSnafu, ProbeError};

pub async fn check_exec(argv: &[String]) -> Result<Readiness, ProbeError> {
    let (program, args) = argv.split_first().ok_or_else(|| EmptyCommandSnafu.build())?;

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await;

    let output = match output {
        Ok(output) => output,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return CommandNotFoundSnafu {
                program: program.as_str(),
            }
            .fail();
        }
        Err(e) => return Ok(Readiness::NotReady(format!("failed to run {program}: {e}"))),
    };

    if output.status.success() {
        return Ok(Readiness::Ready);
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let last_line = stderr.lines().rev().find(|l| !l.trim().is_empty());
    let status = match output.status.code() {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    };

    Ok(Readiness::NotReady(match last_line {
        Some(line) => format!("{program} failed with {status}: {}", line.trim()),
        None => format!("{program} failed with {status}"),
    }))
}
