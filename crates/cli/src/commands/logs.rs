// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster logs` - recent output lines for one worker.
//!
//! Lines come from the per-worker sink file under the state directory, so
//! history survives across one-shot invocations. `--follow` polls the file
//! for growth; truncation (e.g. manual rotation) resets the cursor.

use crate::exit_error::ExitError;
use muster_core::WorkerName;
use muster_supervisor::Controller;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;

const FOLLOW_POLL: Duration = Duration::from_millis(250);

pub async fn run(
    controller: &Controller,
    name: &str,
    lines: usize,
    follow: bool,
) -> Result<(), ExitError> {
    if controller.manifest().get(name).is_none() {
        return Err(ExitError::new(1, format!("unknown worker '{}'", name)));
    }
    let worker = WorkerName::new(name);
    let path = controller
        .logs()
        .sink_path(&worker)
        .ok_or_else(|| ExitError::new(1, "log sink is not configured"))?;

    let mut offset = print_tail(&path, lines)?;
    if !follow {
        return Ok(());
    }

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.map_err(|e| ExitError::new(1, e.to_string()))?;
                return Ok(());
            }
            _ = tokio::time::sleep(FOLLOW_POLL) => {
                offset = print_from(&path, offset)?;
            }
        }
    }
}

/// Print the last `lines` lines of the file; returns the read cursor.
fn print_tail(path: &Path, lines: usize) -> Result<u64, ExitError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        // No file yet just means the worker has not produced output.
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(read_error(path, e)),
    };
    let all: Vec<&str> = content.lines().collect();
    let start = all.len().saturating_sub(lines);
    for line in &all[start..] {
        println!("{}", line);
    }
    Ok(content.len() as u64)
}

/// Print whatever the file grew by since `offset`; returns the new cursor.
fn print_from(path: &Path, offset: u64) -> Result<u64, ExitError> {
    let mut file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(offset),
        Err(e) => return Err(read_error(path, e)),
    };
    let len = file.metadata().map_err(|e| read_error(path, e))?.len();
    if len == offset {
        return Ok(offset);
    }
    // Shrunk file: start over from the top.
    let from = if len < offset { 0 } else { offset };
    file.seek(SeekFrom::Start(from)).map_err(|e| read_error(path, e))?;
    let mut fresh = String::new();
    file.read_to_string(&mut fresh).map_err(|e| read_error(path, e))?;
    print!("{}", fresh);
    Ok(len)
}

fn read_error(path: &Path, e: std::io::Error) -> ExitError {
    ExitError::new(1, format!("cannot read {}: {}", path.display(), e))
}
