// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output routing: per-worker ring buffer plus live fan-out.
//!
//! The router attaches to a worker's output stream exactly once per spawn
//! and fans lines out to any number of subscribers over independent bounded
//! channels, so one slow subscriber cannot block the others or the worker's
//! own pipes. The ring buffer never drops for late subscribers (a new
//! subscriber replays it in full, then streams live); live fan-out may drop
//! lines for a subscriber whose channel is full — bounded, by contract.

use muster_core::{Clock, SystemClock, WorkerName};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// One timestamped output line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub ts_ms: u64,
    pub line: String,
}

/// Headroom on subscriber channels beyond the replayed ring contents.
const LIVE_BUFFER: usize = 256;

struct WorkerLog {
    ring: VecDeque<LogLine>,
    subscribers: Vec<mpsc::Sender<LogLine>>,
    /// Append-only sink file, opened lazily on first line.
    sink: Option<File>,
}

impl WorkerLog {
    fn new() -> Self {
        Self { ring: VecDeque::new(), subscribers: Vec::new(), sink: None }
    }
}

/// Fan-out router over every worker's output.
pub struct LogRouter<C: Clock = SystemClock> {
    capacity: usize,
    clock: C,
    /// When set, every line is also appended to `<dir>/<worker>.log`, so
    /// later supervisor invocations can read history the in-memory ring
    /// cannot carry across processes.
    sink_dir: Option<PathBuf>,
    workers: Mutex<HashMap<WorkerName, WorkerLog>>,
}

impl LogRouter<SystemClock> {
    pub fn new(capacity: usize) -> Self {
        Self::with_clock(capacity, SystemClock)
    }
}

impl<C: Clock> LogRouter<C> {
    pub fn with_clock(capacity: usize, clock: C) -> Self {
        Self { capacity, clock, sink_dir: None, workers: Mutex::new(HashMap::new()) }
    }

    /// Mirror every line into per-worker files under `dir`.
    pub fn with_sink_dir(mut self, dir: PathBuf) -> Self {
        self.sink_dir = Some(dir);
        self
    }

    /// The sink file a worker's lines land in, when a sink dir is set.
    pub fn sink_path(&self, name: &WorkerName) -> Option<PathBuf> {
        self.sink_dir.as_ref().map(|dir| dir.join(format!("{}.log", name)))
    }

    /// Attach a freshly spawned worker's output stream.
    ///
    /// Spawns the drain task; the ring survives across re-attachment so a
    /// restarted worker's history accumulates in one place.
    pub fn attach(self: &Arc<Self>, name: WorkerName, mut lines: mpsc::Receiver<String>) {
        let router = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(line) = lines.recv().await {
                router.push(&name, line);
            }
            debug!(worker = %name, "output stream closed");
        });
    }

    /// Append one line: stamp, ring-buffer, fan out.
    ///
    /// Single producer per worker; the lock serializes replay-vs-live so
    /// subscribers observe every line exactly once, in production order.
    pub fn push(&self, name: &WorkerName, line: String) {
        let entry = LogLine { ts_ms: self.clock.epoch_ms(), line };
        let taken_sink = {
            let mut workers = self.workers.lock();
            let log = workers.entry(name.clone()).or_insert_with(WorkerLog::new);

            if log.ring.len() == self.capacity {
                log.ring.pop_front();
            }
            log.ring.push_back(entry.clone());

            // Full channel means a slow subscriber loses this line; closed
            // channels are pruned.
            log.subscribers.retain(|tx| match tx.try_send(entry.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => true,
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            });

            if self.sink_dir.is_some() {
                log.sink.take()
            } else {
                None
            }
        };

        // File IO happens outside the lock; a slow disk stalls only this
        // worker's drain task. Single producer per worker, so the taken
        // sink cannot race another push for the same name.
        if let Some(dir) = &self.sink_dir {
            let mut sink = taken_sink.or_else(|| open_sink(dir, name));
            if let Some(file) = &mut sink {
                if let Err(e) = writeln!(file, "{}", entry.line) {
                    warn!(worker = %name, error = %e, "log sink write failed");
                    sink = None;
                }
            }
            if let Some(file) = sink {
                let mut workers = self.workers.lock();
                if let Some(log) = workers.get_mut(name) {
                    log.sink = Some(file);
                }
            }
        }
    }

    /// Subscribe: current ring contents (replay), then live lines.
    ///
    /// Unsubscribe by dropping the receiver.
    pub fn subscribe(&self, name: &WorkerName) -> mpsc::Receiver<LogLine> {
        let mut workers = self.workers.lock();
        let log = workers.entry(name.clone()).or_insert_with(WorkerLog::new);

        let (tx, rx) = mpsc::channel(log.ring.len() + LIVE_BUFFER);
        for line in &log.ring {
            // Capacity covers the full ring, so replay cannot drop.
            let _ = tx.try_send(line.clone());
        }
        log.subscribers.push(tx);
        rx
    }

    /// Most recent `count` lines (all buffered lines when `None`), oldest
    /// first. For one-shot `logs` queries without follow.
    pub fn tail(&self, name: &WorkerName, count: Option<usize>) -> Vec<LogLine> {
        let workers = self.workers.lock();
        let Some(log) = workers.get(name) else { return Vec::new() };
        let take = count.unwrap_or(log.ring.len()).min(log.ring.len());
        log.ring.iter().skip(log.ring.len() - take).cloned().collect()
    }
}

fn open_sink(dir: &PathBuf, name: &WorkerName) -> Option<File> {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "cannot create log sink dir");
        return None;
    }
    let path = dir.join(format!("{}.log", name));
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "cannot open log sink");
            None
        }
    }
}

#[cfg(test)]
#[path = "logs_tests.rs"]
mod tests;
