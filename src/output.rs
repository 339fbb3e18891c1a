// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::config::ServiceSpec;
use crate::deploy::ServiceStatus;
use crate::report::DeploymentReport;

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => println!("{message}"),
            OutputMode::Json => self.emit_event("success", message, false),
        }
    }

    /// Print a warning message.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => self.emit_event("warning", message, true),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => eprintln!("Error: {message}"),
            OutputMode::Json => self.emit_event("error", message, true),
        }
    }

    /// Print the tiers a deployment would run, without running them.
    pub fn plan(&self, platform: &str, tiers: &[Vec<&ServiceSpec>]) {
        if self.mode == OutputMode::Json {
            let plan = PlanJson {
                platform,
                tiers: tiers
                    .iter()
                    .map(|tier| tier.iter().map(|s| s.name.as_str()).collect())
                    .collect(),
            };
            if let Ok(json) = serde_json::to_string_pretty(&plan) {
                println!("{json}");
            }
            return;
        }

        println!("Deployment plan for {platform}:");
        for (n, tier) in tiers.iter().enumerate() {
            println!("  tier {n}:");
            for spec in tier {
                println!(
                    "    {:<24} {} {} (timeout {}, every {})",
                    spec.name.as_str(),
                    spec.probe.kind(),
                    spec.probe.target(),
                    humantime::format_duration(spec.timeout),
                    humantime::format_duration(spec.interval),
                );
            }
        }
    }

    /// Print the final report.
    pub fn report(&self, report: &DeploymentReport) {
        match self.mode {
            OutputMode::Json => match serde_json::to_string_pretty(report) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("Error: failed to serialize report: {e}"),
            },
            OutputMode::Quiet => println!("{}", summary_line(report)),
            OutputMode::Normal => {
                for outcome in &report.services {
                    let marker = match outcome.status {
                        ServiceStatus::Ready => "✓",
                        ServiceStatus::TimedOut | ServiceStatus::Errored => "✗",
                    };
                    let mut line = format!(
                        "  {marker} [tier {}] {:<24} {:<9} {} attempt(s), {:.1}s",
                        outcome.tier,
                        outcome.service.as_str(),
                        outcome.status.to_string(),
                        outcome.attempts.len(),
                        outcome.total_elapsed_ms as f64 / 1000.0,
                    );
                    if let Some(reason) = &outcome.reason {
                        line.push_str(&format!(": {reason}"));
                    }
                    println!("{line}");
                }
                for warning in &report.warnings {
                    eprintln!("Warning: {warning}");
                }
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{} ({:.1}s)", summary_line(report), elapsed);
                } else {
                    println!("{}", summary_line(report));
                }
            }
        }
    }

    fn emit_event(&self, event: &str, message: &str, to_stderr: bool) {
        let event = JsonEvent {
            event,
            message,
            duration_secs: self.start_time.map(|_| self.elapsed_secs()),
        };
        if let Ok(json) = serde_json::to_string(&event) {
            if to_stderr {
                eprintln!("{json}");
            } else {
                println!("{json}");
            }
        }
    }
}

fn summary_line(report: &DeploymentReport) -> String {
    let outcome = if report.passed { "PASS" } else { "FAIL" };
    let mut line = format!("{outcome}: {} ({})", report.verdict, report.platform);
    if report.aborted {
        line.push_str(" [aborted]");
    }
    line
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct PlanJson<'a> {
    platform: &'a str,
    tiers: Vec<Vec<&'a str>>,
}
