// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static worker definitions loaded from the manifest.

use crate::name::WorkerName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// How a worker is launched: a native child process or a Docker container.
///
/// Closed set — an unrecognized kind fails manifest deserialization before
/// any worker is touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkerKind {
    /// Native subprocess spawned directly by the supervisor.
    Process,
    /// Containerized workload run via the container runtime CLI.
    Container { image: String },
}

impl WorkerKind {
    /// Short label used in state files and status output.
    pub fn label(&self) -> &'static str {
        match self {
            WorkerKind::Process => "process",
            WorkerKind::Container { .. } => "container",
        }
    }
}

/// Readiness contract for a worker.
///
/// `None` means the worker counts as healthy the moment the spawn succeeds;
/// callers needing deeper readiness must configure an explicit check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HealthCheck {
    #[default]
    None,
    /// Bare TCP connect against 127.0.0.1:port.
    TcpPort { port: u16 },
    /// HTTP GET; healthy when the status matches `expect_status`
    /// (any 2xx when unset).
    HttpGet {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expect_status: Option<u16>,
    },
}

fn default_start_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_stop_grace() -> Duration {
    Duration::from_secs(10)
}

/// Static definition of one managed worker. Immutable during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub name: WorkerName,
    #[serde(flatten)]
    pub kind: WorkerKind,
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub health_check: HealthCheck,
    #[serde(default)]
    pub depends_on: Vec<WorkerName>,
    #[serde(default = "default_start_timeout", with = "crate::duration::serde_str")]
    pub start_timeout: Duration,
    #[serde(default = "default_stop_grace", with = "crate::duration::serde_str")]
    pub stop_grace_timeout: Duration,
}

impl WorkerSpec {
    /// Minimal spec for a native process; used by builders and tests.
    pub fn process(name: impl Into<WorkerName>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: WorkerKind::Process,
            command: command.into(),
            args: Vec::new(),
            working_dir: None,
            env: BTreeMap::new(),
            health_check: HealthCheck::None,
            depends_on: Vec::new(),
            start_timeout: default_start_timeout(),
            stop_grace_timeout: default_stop_grace(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_health_check(mut self, check: HealthCheck) -> Self {
        self.health_check = check;
        self
    }

    pub fn with_depends_on(
        mut self,
        deps: impl IntoIterator<Item = impl Into<WorkerName>>,
    ) -> Self {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_start_timeout(mut self, timeout: Duration) -> Self {
        self.start_timeout = timeout;
        self
    }

    pub fn with_stop_grace_timeout(mut self, timeout: Duration) -> Self {
        self.stop_grace_timeout = timeout;
        self
    }
}

#[cfg(test)]
#[path = "spec_tests.rs"]
mod tests;
