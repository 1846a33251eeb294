// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One spawned (or adopted) worker behind a single handle shape.
//!
//! Closed over two launch kinds — native subprocess and Docker container —
//! plus the adopted mode used after recovery, where signal and wait still
//! work but no output stream exists. Arguments are always passed as a
//! discrete vector; nothing here ever goes through a shell.

mod container;
mod native;

pub(crate) use container::{container_alive, run_docker};

use crate::error::SpawnError;
use muster_core::{validate_spec_strings, WorkerKind, WorkerName, WorkerSpec};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::warn;

/// How a worker finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExitInfo {
    /// Exit status code; `None` when the worker was killed by a signal.
    pub code: Option<i32>,
    pub signaled: bool,
}

impl ExitInfo {
    pub fn clean(&self) -> bool {
        self.code == Some(0)
    }
}

/// Termination request kinds, escalating left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    /// SIGTERM / container stop request.
    Terminate,
    /// SIGKILL / container force-remove.
    Kill,
}

#[derive(Debug)]
enum Target {
    /// Child spawned by this supervisor; exit delivered over `exit_rx`.
    Native { pid: i32 },
    /// Container started by this supervisor.
    Container { id: String },
    /// Re-attached after recovery: no exit channel, no output stream.
    AdoptedNative { pid: i32 },
    AdoptedContainer { id: String },
}

/// Handle to one live worker. Owned exclusively by its registry record;
/// the owner must signal and wait before discarding it, or the underlying
/// process/container leaks.
#[derive(Debug)]
pub struct ProcessHandle {
    name: WorkerName,
    target: Target,
    /// Identity fingerprint distinguishing this process from a later one
    /// reusing the same pid. `None` for containers (ids are unique).
    identity: Option<String>,
    exit_rx: Option<watch::Receiver<Option<ExitInfo>>>,
    output_rx: parking_lot::Mutex<Option<mpsc::Receiver<String>>>,
}

impl ProcessHandle {
    /// Launch a worker according to its spec.
    ///
    /// Native kinds spawn a child with stdout/stderr captured; container
    /// kinds issue `docker run -d` and map the container id into the same
    /// handle shape.
    pub async fn spawn(spec: &WorkerSpec) -> Result<Self, SpawnError> {
        // Manifest loading already validated these strings; library callers
        // constructing specs directly get the same guard.
        validate_spec_strings(spec)?;
        match &spec.kind {
            WorkerKind::Process => native::spawn(spec),
            WorkerKind::Container { image } => container::spawn(spec, image).await,
        }
    }

    /// Re-attach to a worker started by a previous supervisor instance.
    ///
    /// `signal` and `wait` still function; `output` yields nothing.
    pub fn adopt(name: WorkerName, kind: &WorkerKind, handle_id: &str) -> Option<Self> {
        let (target, identity) = match kind {
            WorkerKind::Process => {
                let pid: i32 = handle_id.parse().ok()?;
                (Target::AdoptedNative { pid }, pid_start_ticks(pid))
            }
            WorkerKind::Container { .. } => {
                (Target::AdoptedContainer { id: handle_id.to_string() }, None)
            }
        };
        Some(Self {
            name,
            target,
            identity,
            exit_rx: None,
            output_rx: parking_lot::Mutex::new(None),
        })
    }

    pub fn name(&self) -> &WorkerName {
        &self.name
    }

    /// Opaque pid-or-container-id string, as persisted to disk.
    pub fn handle_id(&self) -> String {
        match &self.target {
            Target::Native { pid } | Target::AdoptedNative { pid } => pid.to_string(),
            Target::Container { id } | Target::AdoptedContainer { id } => id.clone(),
        }
    }

    pub fn is_adopted(&self) -> bool {
        matches!(&self.target, Target::AdoptedNative { .. } | Target::AdoptedContainer { .. })
    }

    /// Spawn-time identity fingerprint, persisted alongside the handle id.
    pub fn identity(&self) -> Option<String> {
        self.identity.clone()
    }

    /// Send a graceful-terminate or kill request.
    pub async fn signal(&self, kind: SignalKind) {
        match &self.target {
            Target::Native { pid } | Target::AdoptedNative { pid } => {
                let sig = match kind {
                    SignalKind::Terminate => Signal::SIGTERM,
                    SignalKind::Kill => Signal::SIGKILL,
                };
                if let Err(e) = kill(Pid::from_raw(*pid), sig) {
                    // ESRCH just means the worker already exited.
                    if e != nix::errno::Errno::ESRCH {
                        warn!(worker = %self.name, pid, signal = ?sig, error = %e, "signal failed");
                    }
                }
            }
            Target::Container { id } | Target::AdoptedContainer { id } => {
                let result = match kind {
                    SignalKind::Terminate => run_docker(&["kill", "--signal", "TERM", id]).await,
                    SignalKind::Kill => run_docker(&["rm", "-f", id]).await,
                };
                if let Err(e) = result {
                    warn!(worker = %self.name, container = %id, ?kind, error = %e, "container signal failed");
                }
            }
        }
    }

    /// Wait until the worker exits. Intended to run on its own task — the
    /// orchestration loop bounds it with timeouts, never blocks on it raw.
    pub async fn wait(&self) -> ExitInfo {
        if let Some(rx) = &self.exit_rx {
            let mut rx = rx.clone();
            loop {
                if let Some(exit) = *rx.borrow() {
                    return exit;
                }
                if rx.changed().await.is_err() {
                    // Watcher task gone without publishing; treat as killed.
                    return ExitInfo { code: None, signaled: true };
                }
            }
        }
        // Adopted mode: poll for disappearance.
        loop {
            if !self.alive().await {
                return ExitInfo { code: None, signaled: false };
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    }

    /// Point-in-time existence check for the underlying process/container.
    pub async fn alive(&self) -> bool {
        match &self.target {
            Target::Native { pid } | Target::AdoptedNative { pid } => pid_alive(*pid),
            Target::Container { id } | Target::AdoptedContainer { id } => container_alive(id).await,
        }
    }

    /// Take the line-delimited output stream. Yields `None` for adopted
    /// handles and on second take — the log router attaches exactly once.
    pub fn take_output(&self) -> Option<mpsc::Receiver<String>> {
        self.output_rx.lock().take()
    }

    pub(crate) fn from_parts(
        name: WorkerName,
        target_native_pid: Option<i32>,
        container_id: Option<String>,
        exit_rx: watch::Receiver<Option<ExitInfo>>,
        output_rx: mpsc::Receiver<String>,
    ) -> Self {
        let target = match (target_native_pid, container_id) {
            (Some(pid), _) => Target::Native { pid },
            (None, Some(id)) => Target::Container { id },
            // Unreachable by construction; fall back to a dead pid.
            (None, None) => Target::Native { pid: -1 },
        };
        let identity = target_native_pid.and_then(pid_start_ticks);
        Self {
            name,
            target,
            identity,
            exit_rx: Some(exit_rx),
            output_rx: parking_lot::Mutex::new(Some(output_rx)),
        }
    }
}

/// Kernel start time (in clock ticks since boot) for a pid, read from
/// `/proc/<pid>/stat`. Two processes that ever shared a pid differ here, so
/// it distinguishes a persisted record's process from a pid-reuse impostor.
/// `None` when the process is gone or procfs is unavailable.
pub(crate) fn pid_start_ticks(pid: i32) -> Option<String> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    // The comm field may contain spaces or parens; the fixed-format fields
    // resume after the last closing paren. starttime is field 22 overall,
    // the 20th after comm.
    let rest = stat.rsplit_once(')')?.1;
    rest.split_whitespace().nth(19).map(str::to_string)
}

/// Whether a pid names a live process (signal 0 existence probe).
pub(crate) fn pid_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    kill(Pid::from_raw(pid), None).is_ok()
}

/// Whether a persisted handle id still names a live worker.
pub(crate) async fn handle_alive(kind: &WorkerKind, handle_id: &str) -> bool {
    match kind {
        WorkerKind::Process => handle_id.parse::<i32>().map(pid_alive).unwrap_or(false),
        WorkerKind::Container { .. } => container_alive(handle_id).await,
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
