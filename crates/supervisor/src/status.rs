// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Point-in-time status aggregation across the whole fleet.
//!
//! Probes run concurrently, each bounded by the per-attempt probe timeout,
//! and the whole report is bounded by `report_deadline` — one hung worker
//! degrades its own row to `deadline_exceeded` instead of stalling the
//! report.

use crate::probe::{Probe, ProbeOutcome};
use crate::process::ExitInfo;
use crate::registry::Registry;
use muster_core::{Clock, HealthCheck, SystemClock, WorkerName, WorkerState};
use muster_manifest::Manifest;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::debug;

/// Fresh probe result for one status row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ProbeStatus {
    Healthy,
    Unhealthy { reason: String },
    Error { reason: String },
    /// The report deadline lapsed before this worker's probe finished.
    DeadlineExceeded,
}

impl From<ProbeOutcome> for ProbeStatus {
    fn from(outcome: ProbeOutcome) -> Self {
        match outcome {
            ProbeOutcome::Healthy => ProbeStatus::Healthy,
            ProbeOutcome::Unhealthy { reason } => ProbeStatus::Unhealthy { reason },
            ProbeOutcome::Error { reason } => ProbeStatus::Error { reason },
        }
    }
}

/// One row of the aggregated report.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub name: WorkerName,
    pub kind: String,
    pub state: WorkerState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_health_check_ms: Option<u64>,
    /// Fresh probe result; absent for workers that are not running or have
    /// no health check configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<ProbeStatus>,
    pub consecutive_failures: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit: Option<ExitInfo>,
}

/// Aggregated fleet report, rows in manifest order.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub workers: Vec<WorkerStatus>,
}

impl StatusReport {
    pub fn get(&self, name: &str) -> Option<&WorkerStatus> {
        self.workers.iter().find(|w| w.name == *name)
    }
}

/// Build the report: registry snapshot plus one concurrent fresh probe per
/// running worker, all under `report_deadline`.
pub async fn report(
    manifest: &Manifest,
    registry: &Registry,
    probe: &Probe,
    probe_timeout: Duration,
    report_deadline: Duration,
) -> StatusReport {
    let now = SystemClock.epoch_ms();

    let mut probes: JoinSet<(WorkerName, ProbeOutcome)> = JoinSet::new();
    for spec in &manifest.workers {
        let active =
            registry.get(&spec.name).map(|r| r.state.is_active()).unwrap_or(false);
        if !active || spec.health_check == HealthCheck::None {
            continue;
        }
        let probe = probe.clone();
        let check = spec.health_check.clone();
        let name = spec.name.clone();
        probes.spawn(async move {
            let outcome = probe.check(&check, probe_timeout).await;
            (name, outcome)
        });
    }

    let mut fresh: HashMap<WorkerName, ProbeStatus> = HashMap::new();
    let gather = async {
        while let Some(joined) = probes.join_next().await {
            if let Ok((name, outcome)) = joined {
                fresh.insert(name, outcome.into());
            }
        }
    };
    if tokio::time::timeout(report_deadline, gather).await.is_err() {
        debug!("status deadline lapsed with probes outstanding");
    }

    let workers = manifest
        .workers
        .iter()
        .map(|spec| {
            let record = registry.get(&spec.name);
            let state = record.as_ref().map(|r| r.state).unwrap_or(WorkerState::Stopped);
            let probed = if fresh.contains_key(&spec.name) {
                fresh.get(&spec.name).cloned()
            } else if state.is_active() && spec.health_check != HealthCheck::None {
                Some(ProbeStatus::DeadlineExceeded)
            } else {
                None
            };
            WorkerStatus {
                name: spec.name.clone(),
                kind: spec.kind.label().to_string(),
                state,
                handle_id: record.as_ref().and_then(|r| r.handle_id()),
                uptime_ms: record.as_ref().and_then(|r| {
                    if state.is_active() {
                        r.started_at_ms.map(|t| now.saturating_sub(t))
                    } else {
                        None
                    }
                }),
                last_health_check_ms: record.as_ref().and_then(|r| r.last_health_check_ms),
                probe: probed,
                consecutive_failures: record.as_ref().map(|r| r.consecutive_failures).unwrap_or(0),
                exit: record.as_ref().and_then(|r| r.exit),
            }
        })
        .collect();

    StatusReport { workers }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
