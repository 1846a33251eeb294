// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static dependency graph over worker specs.
//!
//! The graph is built once at manifest load and is the sole authority on
//! ordering: `start_order` for forward walks, `stop_order` for teardown,
//! and the two closures for operations scoped to a single worker.

use muster_core::{WorkerName, WorkerSpec};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("worker '{worker}' depends on unknown worker '{dependency}'")]
    UnknownDependency { worker: WorkerName, dependency: WorkerName },
    #[error("dependency cycle involving worker '{0}'")]
    Cycle(WorkerName),
}

/// Pre-validated dependency relationships between workers.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
    /// Topological start order; dependencies strictly before dependents.
    order: Vec<WorkerName>,
    deps: HashMap<WorkerName, Vec<WorkerName>>,
    dependents: HashMap<WorkerName, Vec<WorkerName>>,
}

impl DependencyGraph {
    /// Build the graph, rejecting unknown dependencies and cycles.
    ///
    /// The topological order is deterministic: among workers whose
    /// dependencies are all satisfied, manifest order wins.
    pub fn build(specs: &[WorkerSpec]) -> Result<Self, GraphError> {
        let known: HashSet<&str> = specs.iter().map(|s| s.name.as_str()).collect();

        let mut deps: HashMap<WorkerName, Vec<WorkerName>> = HashMap::new();
        let mut dependents: HashMap<WorkerName, Vec<WorkerName>> = HashMap::new();
        for spec in specs {
            for dep in &spec.depends_on {
                if !known.contains(dep.as_str()) {
                    return Err(GraphError::UnknownDependency {
                        worker: spec.name.clone(),
                        dependency: dep.clone(),
                    });
                }
                dependents.entry(dep.clone()).or_default().push(spec.name.clone());
            }
            deps.insert(spec.name.clone(), spec.depends_on.clone());
        }

        // Kahn's algorithm, scanning in manifest order for determinism.
        let mut order: Vec<WorkerName> = Vec::with_capacity(specs.len());
        let mut placed: HashSet<&str> = HashSet::new();
        while order.len() < specs.len() {
            let mut progressed = false;
            for spec in specs {
                if placed.contains(spec.name.as_str()) {
                    continue;
                }
                if spec.depends_on.iter().all(|d| placed.contains(d.as_str())) {
                    placed.insert(spec.name.as_str());
                    order.push(spec.name.clone());
                    progressed = true;
                }
            }
            if !progressed {
                // Everything unplaced is on or behind a cycle; report the
                // first one in manifest order.
                let stuck = specs
                    .iter()
                    .find(|s| !placed.contains(s.name.as_str()))
                    .map(|s| s.name.clone())
                    .unwrap_or_else(|| WorkerName::new("?"));
                return Err(GraphError::Cycle(stuck));
            }
        }

        Ok(Self { order, deps, dependents })
    }

    /// Workers in dependency-first start order.
    pub fn start_order(&self) -> &[WorkerName] {
        &self.order
    }

    /// Workers in reverse dependency order for teardown.
    pub fn stop_order(&self) -> Vec<WorkerName> {
        self.order.iter().rev().cloned().collect()
    }

    /// Direct dependencies of a worker.
    pub fn dependencies(&self, name: &WorkerName) -> &[WorkerName] {
        self.deps.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The worker plus its transitive dependencies, in start order.
    ///
    /// This is the set `start_one` must walk: everything here but the worker
    /// itself must be healthy before the worker spawns.
    pub fn dependency_closure(&self, name: &WorkerName) -> Vec<WorkerName> {
        let mut closure = HashSet::new();
        self.collect(name, &self.deps, &mut closure);
        self.order.iter().filter(|n| closure.contains(n.as_str())).cloned().collect()
    }

    /// The worker plus everything that transitively depends on it, in stop
    /// order (dependents strictly before the worker).
    pub fn dependent_closure(&self, name: &WorkerName) -> Vec<WorkerName> {
        let mut closure = HashSet::new();
        self.collect(name, &self.dependents, &mut closure);
        self.order.iter().rev().filter(|n| closure.contains(n.as_str())).cloned().collect()
    }

    fn collect(
        &self,
        name: &WorkerName,
        edges: &HashMap<WorkerName, Vec<WorkerName>>,
        out: &mut HashSet<String>,
    ) {
        if !out.insert(name.as_str().to_string()) {
            return;
        }
        if let Some(next) = edges.get(name) {
            for n in next {
                self.collect(n, edges, out);
            }
        }
    }
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
