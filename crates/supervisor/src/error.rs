// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Supervisor error taxonomy.
//!
//! Configuration problems surface as `ManifestError` before any side effect.
//! Everything else scopes to a single worker: a spawn failure stops that
//! worker's subtree, a health-check timeout marks the worker Failed but
//! leaves it running for inspection, a termination timeout is escalated
//! exactly once and then reported.

use muster_core::{ValidateError, WorkerName};
use muster_manifest::ManifestError;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure to launch one worker. Dependents are not started.
#[derive(Debug, Error)]
pub enum SpawnError {
    /// Launch strings failed the allow-list; nothing was executed.
    #[error(transparent)]
    Invalid(#[from] ValidateError),
    #[error("failed to spawn '{command}': {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("spawned process has no pid (exited immediately?)")]
    NoPid,
    #[error("container runtime error: {0}")]
    ContainerRuntime(String),
}

/// Failure reading or writing the on-disk runtime records.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state dir {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt state record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("unknown worker '{0}'")]
    UnknownWorker(WorkerName),
    #[error("worker '{worker}': {source}")]
    Spawn {
        worker: WorkerName,
        #[source]
        source: SpawnError,
    },
    #[error("worker '{worker}' not healthy after {waited:?}")]
    HealthCheckTimeout { worker: WorkerName, waited: Duration },
    #[error("worker '{worker}' still present after forced termination")]
    TerminationTimeout { worker: WorkerName },
    #[error("worker '{worker}' requires '{dependency}' to be healthy")]
    DependencyNotHealthy { worker: WorkerName, dependency: WorkerName },
    #[error(transparent)]
    State(#[from] StateError),
}
