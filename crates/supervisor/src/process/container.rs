// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Containerized workloads via the Docker CLI.
//!
//! Containers are created detached (`run -d`) and named `muster-<worker>` so
//! a status-only tool can find them. They join the host network so health
//! endpoints are reachable at 127.0.0.1 like native workers.

use super::{ExitInfo, ProcessHandle};
use crate::error::SpawnError;
use muster_core::WorkerSpec;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

/// Run a docker CLI invocation (argument vector, never a shell string) and
/// return trimmed stdout.
pub(crate) async fn run_docker(args: &[&str]) -> Result<String, SpawnError> {
    let output = Command::new("docker")
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| SpawnError::Io { command: "docker".to_string(), source })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SpawnError::ContainerRuntime(format!(
            "docker {} failed: {}",
            args.first().unwrap_or(&""),
            stderr.trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether a container id/name is currently running.
pub(crate) async fn container_alive(id: &str) -> bool {
    match run_docker(&["inspect", "--format", "{{.State.Running}}", id]).await {
        Ok(out) => out == "true",
        Err(_) => false,
    }
}

pub(super) async fn spawn(spec: &WorkerSpec, image: &str) -> Result<ProcessHandle, SpawnError> {
    let container_name = format!("muster-{}", spec.name);

    // Stale container from a previous crashed run blocks the name; clear it.
    let _ = run_docker(&["rm", "-f", &container_name]).await;

    let mut args: Vec<String> = vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        container_name,
        "--network".into(),
        "host".into(),
    ];
    for (key, value) in &spec.env {
        args.push("-e".into());
        args.push(format!("{}={}", key, value));
    }
    if let Some(dir) = &spec.working_dir {
        args.push("-w".into());
        args.push(dir.display().to_string());
    }
    args.push(image.to_string());
    args.push(spec.command.clone());
    args.extend(spec.args.iter().cloned());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    let container_id = run_docker(&arg_refs).await?;
    debug!(worker = %spec.name, container = %container_id, image, "container worker started");

    let (line_tx, line_rx) = mpsc::channel::<String>(256);
    stream_logs(&container_id, line_tx);

    let (exit_tx, exit_rx) = watch::channel(None);
    let id = container_id.clone();
    let worker = spec.name.clone();
    tokio::spawn(async move {
        let exit = match run_docker(&["wait", &id]).await {
            Ok(code_str) => ExitInfo { code: code_str.parse::<i32>().ok(), signaled: false },
            Err(e) => {
                // `docker wait` fails when the container is force-removed.
                warn!(worker = %worker, container = %id, error = %e, "container wait ended");
                ExitInfo { code: None, signaled: true }
            }
        };
        let _ = exit_tx.send(Some(exit));
    });

    Ok(ProcessHandle::from_parts(spec.name.clone(), None, Some(container_id), exit_rx, line_rx))
}

/// Attach `docker logs -f` and forward its lines into the output channel.
fn stream_logs(container_id: &str, tx: mpsc::Sender<String>) {
    let id = container_id.to_string();
    tokio::spawn(async move {
        let child = Command::new("docker")
            .args(["logs", "-f", &id])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let Ok(mut child) = child else { return };

        let mut tasks = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            }));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
            }));
        }
        for task in tasks {
            let _ = task.await;
        }
        let _ = child.wait().await;
    });
}
