// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Native subprocess spawning.

use super::{ExitInfo, ProcessHandle};
use crate::error::SpawnError;
use muster_core::WorkerSpec;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Output channel depth per worker. The drain task in the log router keeps
/// up under normal load; a full channel backpressures the reader tasks, not
/// the worker's own pipes going unread.
const OUTPUT_CHANNEL_DEPTH: usize = 256;

pub(super) fn spawn(spec: &WorkerSpec) -> Result<ProcessHandle, SpawnError> {
    let mut cmd = Command::new(&spec.command);
    cmd.args(&spec.args)
        .envs(&spec.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = &spec.working_dir {
        cmd.current_dir(dir);
    }

    let mut child = cmd
        .spawn()
        .map_err(|source| SpawnError::Io { command: spec.command.clone(), source })?;
    let pid = child.id().ok_or(SpawnError::NoPid)? as i32;
    debug!(worker = %spec.name, pid, command = %spec.command, "native worker spawned");

    let (line_tx, line_rx) = mpsc::channel::<String>(OUTPUT_CHANNEL_DEPTH);
    if let Some(stdout) = child.stdout.take() {
        drain_lines(stdout, line_tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        drain_lines(stderr, line_tx);
    }

    // The child is owned by its exit watcher; the handle keeps only the pid
    // (for signals) and the exit channel.
    let (exit_tx, exit_rx) = watch::channel(None);
    let worker = spec.name.clone();
    tokio::spawn(async move {
        let exit = match child.wait().await {
            Ok(status) => ExitInfo { code: status.code(), signaled: status.code().is_none() },
            Err(_) => ExitInfo { code: None, signaled: true },
        };
        debug!(worker = %worker, code = ?exit.code, signaled = exit.signaled, "native worker exited");
        let _ = exit_tx.send(Some(exit));
    });

    Ok(ProcessHandle::from_parts(spec.name.clone(), Some(pid), None, exit_rx, line_rx))
}

/// Forward one pipe's lines into the shared output channel.
fn drain_lines(pipe: impl AsyncRead + Unpin + Send + 'static, tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(pipe).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
}
