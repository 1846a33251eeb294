// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Concurrency-safe worker registry, the single source of truth.
//!
//! Reads dominate, so records sit behind a read-write lock. Every mutation
//! also persists the pid-or-container-id and state to the on-disk store, so
//! a supervisor started after a crash can [`Registry::recover`] instead of
//! double-spawning workers that are still running.

use crate::error::StateError;
use crate::probe::{Probe, ProbeOutcome};
use crate::process::{self, ExitInfo, ProcessHandle};
use crate::statefile::{PersistedWorker, StateStore};
use muster_core::{WorkerName, WorkerSpec, WorkerState};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Mutable runtime record for one active or recently-active worker.
#[derive(Clone)]
pub struct RuntimeRecord {
    pub spec: WorkerSpec,
    pub state: WorkerState,
    /// Present only while a spawn attempt is live; the record is the
    /// handle's exclusive owner.
    pub handle: Option<Arc<ProcessHandle>>,
    pub started_at_ms: Option<u64>,
    pub last_health_check_ms: Option<u64>,
    pub consecutive_failures: u32,
    pub exit: Option<ExitInfo>,
}

impl RuntimeRecord {
    pub fn stopped(spec: WorkerSpec) -> Self {
        Self {
            spec,
            state: WorkerState::Stopped,
            handle: None,
            started_at_ms: None,
            last_health_check_ms: None,
            consecutive_failures: 0,
            exit: None,
        }
    }

    pub fn handle_id(&self) -> Option<String> {
        self.handle.as_ref().map(|h| h.handle_id())
    }
}

/// Outcome of one recovery pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecoverReport {
    /// Workers re-attached in adopted mode.
    pub adopted: Vec<WorkerName>,
    /// Stale records discarded (process gone, or record no longer matches
    /// the manifest).
    pub discarded: Vec<WorkerName>,
}

pub struct Registry {
    records: RwLock<HashMap<WorkerName, RuntimeRecord>>,
    store: StateStore,
}

impl Registry {
    pub fn open(state_dir: &Path) -> Result<Self, StateError> {
        Ok(Self { records: RwLock::new(HashMap::new()), store: StateStore::open(state_dir)? })
    }

    /// Insert or replace a record, persisting its on-disk slice.
    pub fn upsert(&self, record: RuntimeRecord) -> Result<(), StateError> {
        self.persist(&record)?;
        self.records.write().insert(record.spec.name.clone(), record);
        Ok(())
    }

    pub fn get(&self, name: &WorkerName) -> Option<RuntimeRecord> {
        self.records.read().get(name).cloned()
    }

    /// All records, sorted by worker name for stable output.
    pub fn list(&self) -> Vec<RuntimeRecord> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.spec.name.cmp(&b.spec.name));
        records
    }

    pub fn remove(&self, name: &WorkerName) -> Result<Option<RuntimeRecord>, StateError> {
        self.store.remove(name)?;
        Ok(self.records.write().remove(name))
    }

    /// Mutate one record in place (persisting afterwards). Returns false
    /// when no record exists for the name.
    pub fn update<F>(&self, name: &WorkerName, mutate: F) -> Result<bool, StateError>
    where
        F: FnOnce(&mut RuntimeRecord),
    {
        let updated = {
            let mut records = self.records.write();
            match records.get_mut(name) {
                Some(record) => {
                    mutate(record);
                    Some(record.clone())
                }
                None => None,
            }
        };
        match updated {
            Some(record) => {
                self.persist(&record)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Guarded state transition; ignored when the record is missing or the
    /// state machine forbids the move (e.g. an exit watcher racing a stop).
    pub fn transition(&self, name: &WorkerName, to: WorkerState) -> Result<bool, StateError> {
        let mut moved = false;
        self.update(name, |record| {
            if record.state.can_transition_to(to) {
                record.state = to;
                // Stopped means the process is confirmed gone. Failed does
                // not: a worker that missed its health gate is left running.
                if to == WorkerState::Stopped {
                    record.handle = None;
                }
                moved = true;
            }
        })?;
        Ok(moved)
    }

    /// Re-derive records from the on-disk store after a supervisor restart.
    ///
    /// For each persisted record whose pid/container-id is still alive, an
    /// adopted handle is attached and the worker re-enters the registry —
    /// Healthy when a confirming probe passes, Degraded otherwise. Records
    /// pointing at dead or mismatched workers are discarded, never assumed
    /// healthy.
    pub async fn recover(
        &self,
        specs: &[WorkerSpec],
        probe: &Probe,
        probe_timeout: Duration,
    ) -> Result<RecoverReport, StateError> {
        let mut report = RecoverReport::default();

        for persisted in self.store.load_all()? {
            let Some(spec) = specs.iter().find(|s| s.name == persisted.name) else {
                warn!(worker = %persisted.name, "state record has no manifest entry, discarding");
                self.store.remove(&persisted.name)?;
                report.discarded.push(persisted.name);
                continue;
            };

            if spec.kind.label() != persisted.kind {
                warn!(
                    worker = %persisted.name,
                    persisted_kind = %persisted.kind,
                    manifest_kind = %spec.kind.label(),
                    "state record kind mismatch, discarding"
                );
                self.store.remove(&persisted.name)?;
                report.discarded.push(persisted.name);
                continue;
            }

            if !process::handle_alive(&spec.kind, &persisted.handle_id).await {
                info!(worker = %persisted.name, handle = %persisted.handle_id, "stale state record, worker gone");
                self.store.remove(&persisted.name)?;
                report.discarded.push(persisted.name);
                continue;
            }

            // A live pid is not enough: after pid reuse it names an
            // unrelated process. The record is trusted only when the
            // identity fingerprint captured at spawn still matches.
            if let Some(expected) = &persisted.identity {
                let current = persisted
                    .handle_id
                    .parse::<i32>()
                    .ok()
                    .and_then(process::pid_start_ticks);
                if current.as_deref() != Some(expected.as_str()) {
                    warn!(
                        worker = %persisted.name,
                        handle = %persisted.handle_id,
                        "pid now names a different process, discarding"
                    );
                    self.store.remove(&persisted.name)?;
                    report.discarded.push(persisted.name);
                    continue;
                }
            }

            let Some(handle) = ProcessHandle::adopt(
                persisted.name.clone(),
                &spec.kind,
                &persisted.handle_id,
            ) else {
                warn!(worker = %persisted.name, handle = %persisted.handle_id, "unparseable handle id, discarding");
                self.store.remove(&persisted.name)?;
                report.discarded.push(persisted.name);
                continue;
            };

            // One confirming probe before trusting the record.
            let (state, failures) = match probe.check(&spec.health_check, probe_timeout).await {
                ProbeOutcome::Healthy => (WorkerState::Healthy, 0),
                outcome => {
                    warn!(worker = %persisted.name, ?outcome, "adopted worker alive but not serving");
                    (WorkerState::Degraded, 1)
                }
            };

            info!(worker = %persisted.name, handle = %persisted.handle_id, state = %state, "adopted running worker");
            self.upsert(RuntimeRecord {
                spec: spec.clone(),
                state,
                handle: Some(Arc::new(handle)),
                started_at_ms: Some(persisted.started_at_ms),
                last_health_check_ms: None,
                consecutive_failures: failures,
                exit: None,
            })?;
            report.adopted.push(spec.name.clone());
        }

        Ok(report)
    }

    fn persist(&self, record: &RuntimeRecord) -> Result<(), StateError> {
        // A live handle means a process worth finding after a crash, even in
        // Stopping or Failed. No handle means nothing to re-attach to.
        match &record.handle {
            Some(handle) => self.store.write(&PersistedWorker {
                name: record.spec.name.clone(),
                handle_id: handle.handle_id(),
                identity: handle.identity(),
                kind: record.spec.kind.label().to_string(),
                started_at_ms: record.started_at_ms.unwrap_or_default(),
                state: record.state,
            }),
            None => self.store.remove(&record.spec.name),
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
