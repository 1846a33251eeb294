// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering of reports.

use crate::color;
use muster_supervisor::{
    ProbeStatus, RecoverReport, StartReport, StartResult, StatusReport, StopOutcome, StopReport,
};

pub fn describe_start(result: &StartResult) -> String {
    match result {
        StartResult::Started => "started".to_string(),
        StartResult::AlreadyRunning => "already running".to_string(),
        StartResult::SpawnFailed { error } => format!("spawn failed: {}", error),
        StartResult::HealthTimeout { waited } => {
            format!("not healthy after {:.1}s (left running)", waited.as_secs_f64())
        }
        StartResult::ProbeMisconfigured { reason } => {
            format!("health check misconfigured: {}", reason)
        }
        StartResult::DependencyUnhealthy { dependency } => {
            format!("dependency '{}' not healthy", dependency)
        }
        StartResult::Skipped => "skipped".to_string(),
    }
}

pub fn describe_stop(outcome: &StopOutcome) -> String {
    match outcome {
        StopOutcome::ConfirmedStopped { escalated: false } => "stopped".to_string(),
        StopOutcome::ConfirmedStopped { escalated: true } => "stopped (killed)".to_string(),
        StopOutcome::StillPresent => "STILL PRESENT after kill".to_string(),
        StopOutcome::NotRunning => "not running".to_string(),
        StopOutcome::Skipped => "skipped".to_string(),
    }
}

pub fn print_start_report(report: &StartReport) {
    for (name, result) in &report.results {
        println!("{:<20} {}", name, describe_start(result));
    }
}

pub fn print_stop_report(report: &StopReport) {
    for (name, outcome) in &report.entries {
        println!("{:<20} {}", name, describe_stop(outcome));
    }
}

pub fn print_recover_report(report: &RecoverReport) {
    for name in &report.adopted {
        println!("{:<20} adopted", name);
    }
    for name in &report.discarded {
        println!("{:<20} discarded stale record", name);
    }
    if report.adopted.is_empty() && report.discarded.is_empty() {
        println!("nothing to recover");
    }
}

pub fn print_status_table(report: &StatusReport) {
    println!(
        "{}",
        color::header(&format!(
            "{:<20} {:<10} {:<10} {:<14} {:<8} {}",
            "NAME", "KIND", "STATE", "HANDLE", "UPTIME", "HEALTH"
        ))
    );
    for row in &report.workers {
        println!(
            "{:<20} {:<10} {:<10} {:<14} {:<8} {}",
            row.name,
            row.kind,
            row.state,
            row.handle_id.as_deref().unwrap_or("-"),
            row.uptime_ms.map(format_uptime).unwrap_or_else(|| "-".to_string()),
            describe_probe(row.probe.as_ref(), row.exit.map(|e| (e.code, e.signaled))),
        );
    }
}

fn describe_probe(probe: Option<&ProbeStatus>, exit: Option<(Option<i32>, bool)>) -> String {
    match probe {
        Some(ProbeStatus::Healthy) => "ok".to_string(),
        Some(ProbeStatus::Unhealthy { reason }) => format!("unhealthy: {}", reason),
        Some(ProbeStatus::Error { reason }) => format!("check error: {}", reason),
        Some(ProbeStatus::DeadlineExceeded) => "probe deadline exceeded".to_string(),
        None => match exit {
            Some((Some(code), _)) => format!("exit {}", code),
            Some((None, true)) => "killed by signal".to_string(),
            Some((None, false)) => "exited".to_string(),
            None => "-".to_string(),
        },
    }
}

/// Compact elapsed time: "42s", "5m", "3h", "2d".
pub fn format_uptime(ms: u64) -> String {
    let secs = ms / 1000;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else if secs < 86_400 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}d", secs / 86_400)
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
