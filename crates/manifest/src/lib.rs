// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster-manifest: fleet manifest loading and dependency-graph validation.
//!
//! A manifest is a TOML file with an optional `[supervisor]` tuning table and
//! one `[[worker]]` table per managed worker. All validation — duplicate
//! names, unknown kinds, unresolvable or cyclic dependencies, launch-string
//! allow-list — happens at load time, before any worker is touched.

mod graph;

pub use graph::{DependencyGraph, GraphError};

use muster_core::{validate_spec_strings, ValidateError, WorkerName, WorkerSpec};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("manifest defines no workers")]
    Empty,
    #[error("duplicate worker name '{0}'")]
    DuplicateWorker(WorkerName),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Invalid(#[from] ValidateError),
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_report_deadline() -> Duration {
    Duration::from_secs(5)
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(5)
}

fn default_failure_threshold() -> u32 {
    3
}

fn default_log_buffer_lines() -> usize {
    1000
}

/// Supervisor tuning knobs from the `[supervisor]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupervisorConfig {
    /// Root state directory; defaults to the platform state dir when unset.
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    /// Interval between health-probe attempts while a worker is Starting.
    #[serde(default = "default_poll_interval", with = "muster_core::duration::serde_str")]
    pub health_poll_interval: Duration,
    /// Per-attempt probe timeout.
    #[serde(default = "default_probe_timeout", with = "muster_core::duration::serde_str")]
    pub probe_timeout: Duration,
    /// Overall deadline for an aggregated status report.
    #[serde(default = "default_report_deadline", with = "muster_core::duration::serde_str")]
    pub report_deadline: Duration,
    /// Consecutive health-check failures before Degraded becomes Failed.
    #[serde(default = "default_failure_threshold")]
    pub degraded_failure_threshold: u32,
    /// Ring-buffer capacity for each worker's recent output lines.
    #[serde(default = "default_log_buffer_lines")]
    pub log_buffer_lines: usize,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            state_dir: None,
            health_poll_interval: default_poll_interval(),
            probe_timeout: default_probe_timeout(),
            report_deadline: default_report_deadline(),
            degraded_failure_threshold: default_failure_threshold(),
            log_buffer_lines: default_log_buffer_lines(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    supervisor: Option<SupervisorConfig>,
    #[serde(default, rename = "worker")]
    workers: Vec<WorkerSpec>,
}

/// Validated fleet manifest: specs plus the pre-computed dependency graph.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub supervisor: SupervisorConfig,
    pub workers: Vec<WorkerSpec>,
    graph: DependencyGraph,
}

impl Manifest {
    /// Load and validate a manifest from a file.
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ManifestError::Io { path: path.to_path_buf(), source })?;
        let manifest = Self::parse(&content)?;
        debug!(path = %path.display(), workers = manifest.workers.len(), "manifest loaded");
        Ok(manifest)
    }

    /// Parse and validate manifest content.
    ///
    /// Every failure here is a configuration error surfaced before any side
    /// effect: nothing is spawned, signaled or written for a bad manifest.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest = toml::from_str(content)?;
        if raw.workers.is_empty() {
            return Err(ManifestError::Empty);
        }

        let mut seen: HashSet<&str> = HashSet::new();
        for spec in &raw.workers {
            if !seen.insert(spec.name.as_str()) {
                return Err(ManifestError::DuplicateWorker(spec.name.clone()));
            }
            validate_spec_strings(spec)?;
        }

        // Builds the topological order; rejects unknown and cyclic deps.
        let graph = DependencyGraph::build(&raw.workers)?;

        Ok(Self {
            supervisor: raw.supervisor.unwrap_or_default(),
            workers: raw.workers,
            graph,
        })
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.graph
    }

    pub fn get(&self, name: &str) -> Option<&WorkerSpec> {
        self.workers.iter().find(|w| w.name == *name)
    }

    pub fn names(&self) -> impl Iterator<Item = &WorkerName> {
        self.workers.iter().map(|w| &w.name)
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
