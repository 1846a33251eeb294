// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk runtime records: one small JSON file per worker name.
//!
//! The records let a fresh supervisor invocation discover workers a previous
//! instance started, instead of double-spawning them. They are written by a
//! single supervisor process and safe to read concurrently by a status-only
//! tool. Deleting the directory means "forget everything, assume nothing is
//! running".

use crate::error::StateError;
use muster_core::{WorkerName, WorkerState};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// The persisted slice of a runtime record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedWorker {
    pub name: WorkerName,
    /// Opaque pid or container id.
    pub handle_id: String,
    /// Process-identity fingerprint (kernel start time for native pids);
    /// guards adoption against pid reuse. `None` for containers.
    #[serde(default)]
    pub identity: Option<String>,
    /// Worker kind label ("process" / "container").
    pub kind: String,
    pub started_at_ms: u64,
    pub state: WorkerState,
}

/// Append-or-overwrite store of per-worker records under `<dir>/workers`.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
}

impl StateStore {
    /// Open (creating if needed) the store under the given state directory.
    pub fn open(state_dir: &Path) -> Result<Self, StateError> {
        let dir = state_dir.join("workers");
        fs::create_dir_all(&dir)
            .map_err(|source| StateError::Io { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    fn path_for(&self, name: &WorkerName) -> PathBuf {
        self.dir.join(format!("{}.json", name))
    }

    /// Write one record, atomically (write temp, rename over).
    pub fn write(&self, record: &PersistedWorker) -> Result<(), StateError> {
        let path = self.path_for(&record.name);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(record)
            .map_err(|source| StateError::Corrupt { path: path.clone(), source })?;
        fs::write(&tmp, body).map_err(|source| StateError::Io { path: tmp.clone(), source })?;
        fs::rename(&tmp, &path).map_err(|source| StateError::Io { path, source })?;
        Ok(())
    }

    /// Read one record, if present.
    pub fn read(&self, name: &WorkerName) -> Result<Option<PersistedWorker>, StateError> {
        let path = self.path_for(name);
        let body = match fs::read(&path) {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StateError::Io { path, source }),
        };
        let record = serde_json::from_slice(&body)
            .map_err(|source| StateError::Corrupt { path, source })?;
        Ok(Some(record))
    }

    /// Remove one record; absent is fine.
    pub fn remove(&self, name: &WorkerName) -> Result<(), StateError> {
        let path = self.path_for(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StateError::Io { path, source }),
        }
    }

    /// Load every readable record. Corrupt files are skipped with a warning
    /// rather than failing recovery for the whole fleet.
    pub fn load_all(&self) -> Result<Vec<PersistedWorker>, StateError> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|source| StateError::Io { path: self.dir.clone(), source })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StateError::Io { path: self.dir.clone(), source })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match fs::read(&path).ok().and_then(|b| serde_json::from_slice(&b).ok()) {
                Some(record) => records.push(record),
                None => warn!(path = %path.display(), "skipping unreadable state record"),
            }
        }
        records.sort_by(|a: &PersistedWorker, b: &PersistedWorker| a.name.cmp(&b.name));
        Ok(records)
    }
}

#[cfg(test)]
#[path = "statefile_tests.rs"]
mod tests;
