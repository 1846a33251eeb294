// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle orchestration: dependency-ordered start with health gating,
//! reverse-order stop with graceful-then-forced escalation, recovery, and
//! the periodic health sweep.
//!
//! The controller owns no worker state itself; every observation and every
//! transition goes through the [`Registry`], so concurrent status queries
//! and the per-spawn exit watchers always see the same truth.

use crate::logs::LogRouter;
use crate::probe::{Probe, ProbeOutcome};
use crate::process::{ProcessHandle, SignalKind};
use crate::registry::{RecoverReport, Registry, RuntimeRecord};
use crate::status::{self, StatusReport};
use crate::SupervisorError;
use muster_core::{Clock, HealthCheck, SystemClock, WorkerName, WorkerState};
use muster_manifest::{Manifest, SupervisorConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// How long to wait for the process table to reflect a SIGKILL before
/// declaring the worker still present.
const KILL_CONFIRM_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-worker outcome of a start walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartResult {
    Started,
    /// Already Starting, Healthy or Degraded; starting again is a no-op.
    AlreadyRunning,
    SpawnFailed { error: String },
    /// Spawned but never confirmed healthy within `start_timeout`. The
    /// worker is left running, marked Failed, for inspection.
    HealthTimeout { waited: Duration },
    /// The health check itself is unusable (e.g. malformed URL).
    ProbeMisconfigured { reason: String },
    /// A dependency is not Healthy, so this worker was never spawned.
    DependencyUnhealthy { dependency: WorkerName },
    /// Not attempted: an earlier worker in the walk failed, or the walk
    /// was cancelled.
    Skipped,
}

impl StartResult {
    pub fn ok(&self) -> bool {
        matches!(self, StartResult::Started | StartResult::AlreadyRunning)
    }
}

/// Ordered per-worker results of one start walk.
#[derive(Debug, Clone, Default)]
pub struct StartReport {
    pub results: Vec<(WorkerName, StartResult)>,
}

impl StartReport {
    pub fn all_ok(&self) -> bool {
        self.results.iter().all(|(_, r)| r.ok())
    }
}

/// Per-worker outcome of a stop walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Confirmed gone; `escalated` when the grace period lapsed and a kill
    /// was required.
    ConfirmedStopped { escalated: bool },
    /// Still present after forced termination. Marked Failed, reported,
    /// never silently dropped.
    StillPresent,
    NotRunning,
    /// Not attempted because the walk was cancelled.
    Skipped,
}

/// Ordered per-worker results of one stop walk.
#[derive(Debug, Clone, Default)]
pub struct StopReport {
    pub entries: Vec<(WorkerName, StopOutcome)>,
}

impl StopReport {
    pub fn all_stopped(&self) -> bool {
        self.entries
            .iter()
            .all(|(_, o)| !matches!(o, StopOutcome::StillPresent | StopOutcome::Skipped))
    }
}

/// Combined result of a restart: teardown first, then bring-up.
#[derive(Debug, Clone, Default)]
pub struct RestartReport {
    pub stop: StopReport,
    pub start: StartReport,
}

/// Orchestration entry point over one manifest.
pub struct Controller {
    manifest: Manifest,
    config: SupervisorConfig,
    registry: Arc<Registry>,
    probe: Probe,
    logs: Arc<LogRouter>,
    clock: SystemClock,
}

impl Controller {
    pub fn new(manifest: Manifest, state_dir: &Path) -> Result<Self, SupervisorError> {
        let config = manifest.supervisor.clone();
        let registry = Arc::new(Registry::open(state_dir)?);
        let logs = Arc::new(
            LogRouter::new(config.log_buffer_lines).with_sink_dir(state_dir.join("logs")),
        );
        Ok(Self { manifest, config, registry, probe: Probe::new(), logs, clock: SystemClock })
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn logs(&self) -> &Arc<LogRouter> {
        &self.logs
    }

    /// Re-attach to workers left running by a previous supervisor instance.
    pub async fn recover(&self) -> Result<RecoverReport, SupervisorError> {
        let report = self
            .registry
            .recover(&self.manifest.workers, &self.probe, self.config.probe_timeout)
            .await?;
        info!(
            adopted = report.adopted.len(),
            discarded = report.discarded.len(),
            "recovery pass complete"
        );
        Ok(report)
    }

    /// Start every worker in dependency order, gating each on its health
    /// check before moving on. The walk stops at the first failure; workers
    /// not reached are reported as skipped.
    pub async fn start_all(&self, cancel: &CancellationToken) -> StartReport {
        let order: Vec<WorkerName> = self.manifest.graph().start_order().to_vec();
        self.start_walk(&order, cancel).await
    }

    /// Start one worker and (transitively) the dependencies it needs,
    /// skipping whatever is already running.
    pub async fn start_one(
        &self,
        name: &WorkerName,
        cancel: &CancellationToken,
    ) -> Result<StartReport, SupervisorError> {
        if self.manifest.get(name.as_str()).is_none() {
            return Err(SupervisorError::UnknownWorker(name.clone()));
        }
        let order = self.manifest.graph().dependency_closure(name);
        Ok(self.start_walk(&order, cancel).await)
    }

    /// Stop every worker in reverse dependency order. `force` skips the
    /// grace period and kills immediately.
    pub async fn stop_all(&self, force: bool, cancel: &CancellationToken) -> StopReport {
        self.stop_walk(&self.manifest.graph().stop_order(), force, cancel).await
    }

    /// Stop one worker, tearing down its transitive dependents first so no
    /// worker outlives a dependency.
    pub async fn stop_one(
        &self,
        name: &WorkerName,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<StopReport, SupervisorError> {
        if self.manifest.get(name.as_str()).is_none() {
            return Err(SupervisorError::UnknownWorker(name.clone()));
        }
        let order = self.manifest.graph().dependent_closure(name);
        Ok(self.stop_walk(&order, force, cancel).await)
    }

    /// Stop a worker (dependents first), then start the same set back up in
    /// dependency order.
    pub async fn restart(
        &self,
        name: &WorkerName,
        cancel: &CancellationToken,
    ) -> Result<RestartReport, SupervisorError> {
        let stop = self.stop_one(name, false, cancel).await?;
        // Dependent closure reversed is a valid start order for the same set.
        // Only the target and workers this walk actually stopped come back
        // up; a dependent that was already down stays down.
        let mut order: Vec<WorkerName> =
            self.manifest.graph().dependent_closure(name).into_iter().rev().collect();
        order.retain(|n| {
            n == name
                || stop.entries.iter().any(|(stopped, o)| {
                    stopped == n && matches!(o, StopOutcome::ConfirmedStopped { .. })
                })
        });
        let start = self.start_walk(&order, cancel).await;
        Ok(RestartReport { stop, start })
    }

    /// One health pass over every running worker with an explicit check.
    ///
    /// A failed probe moves Healthy to Degraded immediately; after
    /// `degraded_failure_threshold` consecutive failures the worker is
    /// marked Failed (still running — stopping it is an operator decision,
    /// as is restarting its dependents).
    pub async fn health_sweep(&self) -> Result<Vec<(WorkerName, WorkerState)>, SupervisorError> {
        let mut swept = Vec::new();
        for record in self.registry.list() {
            let eligible = matches!(record.state, WorkerState::Healthy | WorkerState::Degraded)
                && record.spec.health_check != HealthCheck::None;
            if !eligible {
                continue;
            }
            let name = record.spec.name.clone();
            let outcome =
                self.probe.check(&record.spec.health_check, self.config.probe_timeout).await;
            let now = self.clock.epoch_ms();
            let threshold = self.config.degraded_failure_threshold;

            let mut state_after = record.state;
            self.registry.update(&name, |r| {
                r.last_health_check_ms = Some(now);
                if outcome.is_healthy() {
                    r.consecutive_failures = 0;
                    if r.state == WorkerState::Degraded {
                        r.state = WorkerState::Healthy;
                    }
                } else {
                    r.consecutive_failures += 1;
                    if r.consecutive_failures >= threshold {
                        r.state = WorkerState::Failed;
                    } else if r.state == WorkerState::Healthy {
                        r.state = WorkerState::Degraded;
                    }
                }
                state_after = r.state;
            })?;
            if state_after != record.state {
                warn!(worker = %name, from = %record.state, to = %state_after, ?outcome, "health sweep transition");
            }
            swept.push((name, state_after));
        }
        Ok(swept)
    }

    /// Aggregate a point-in-time status report across all workers.
    pub async fn status(&self) -> StatusReport {
        status::report(
            &self.manifest,
            &self.registry,
            &self.probe,
            self.config.probe_timeout,
            self.config.report_deadline,
        )
        .await
    }

    async fn start_walk(&self, order: &[WorkerName], cancel: &CancellationToken) -> StartReport {
        let mut report = StartReport::default();
        let mut abandoned = false;
        for name in order {
            if abandoned || cancel.is_cancelled() {
                report.results.push((name.clone(), StartResult::Skipped));
                continue;
            }
            let result = self.start_worker(name, cancel).await;
            if !result.ok() {
                // First failure abandons the rest of the walk; already-started
                // workers are left running.
                abandoned = true;
            }
            report.results.push((name.clone(), result));
        }
        report
    }

    async fn start_worker(&self, name: &WorkerName, cancel: &CancellationToken) -> StartResult {
        let Some(spec) = self.manifest.get(name.as_str()) else {
            // Closure walks only produce manifest names; belt and braces.
            return StartResult::Skipped;
        };

        if let Some(record) = self.registry.get(name) {
            if record.state.is_active() {
                info!(worker = %name, state = %record.state, "already running");
                return StartResult::AlreadyRunning;
            }
            // A Failed worker that missed its health gate is still running;
            // spawning a second copy would orphan it.
            if let Some(handle) = &record.handle {
                if handle.alive().await {
                    warn!(worker = %name, handle = %handle.handle_id(), "previous attempt still present");
                    return StartResult::SpawnFailed {
                        error: "previous attempt still running; stop it first".to_string(),
                    };
                }
            }
        }

        for dep in self.manifest.graph().dependencies(name) {
            let healthy = self
                .registry
                .get(dep)
                .map(|r| r.state == WorkerState::Healthy)
                .unwrap_or(false);
            if !healthy {
                warn!(worker = %name, dependency = %dep, "dependency not healthy, refusing to start");
                return StartResult::DependencyUnhealthy { dependency: dep.clone() };
            }
        }

        info!(worker = %name, kind = %spec.kind.label(), "starting");
        let handle = match ProcessHandle::spawn(spec).await {
            Ok(handle) => Arc::new(handle),
            Err(e) => {
                warn!(worker = %name, error = %e, "spawn failed");
                let record = RuntimeRecord {
                    state: WorkerState::Failed,
                    ..RuntimeRecord::stopped(spec.clone())
                };
                if let Err(e) = self.registry.upsert(record) {
                    warn!(worker = %name, error = %e, "failed to persist spawn failure");
                }
                return StartResult::SpawnFailed { error: e.to_string() };
            }
        };

        if let Some(lines) = handle.take_output() {
            self.logs.attach(name.clone(), lines);
        }

        let record = RuntimeRecord {
            spec: spec.clone(),
            state: WorkerState::Starting,
            handle: Some(Arc::clone(&handle)),
            started_at_ms: Some(self.clock.epoch_ms()),
            last_health_check_ms: None,
            consecutive_failures: 0,
            exit: None,
        };
        if let Err(e) = self.registry.upsert(record) {
            warn!(worker = %name, error = %e, "failed to persist runtime record");
        }
        self.spawn_exit_watcher(name.clone(), Arc::clone(&handle));

        self.gate_on_health(name, spec.health_check.clone(), spec.start_timeout, cancel).await
    }

    /// Poll the worker's health check until it passes, the worker dies, the
    /// start timeout lapses, or the walk is cancelled.
    async fn gate_on_health(
        &self,
        name: &WorkerName,
        check: HealthCheck,
        start_timeout: Duration,
        cancel: &CancellationToken,
    ) -> StartResult {
        if check == HealthCheck::None {
            // Spawn success is the whole readiness contract.
            let _ = self.registry.transition(name, WorkerState::Healthy);
            info!(worker = %name, "started (no health check)");
            return StartResult::Started;
        }

        let started = tokio::time::Instant::now();
        loop {
            // The exit watcher may have observed a death mid-gate.
            match self.registry.get(name) {
                Some(r) if r.state.is_active() => {}
                _ => {
                    warn!(worker = %name, "exited before becoming healthy");
                    return StartResult::SpawnFailed {
                        error: "worker exited before becoming healthy".to_string(),
                    };
                }
            }

            let remaining = start_timeout.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                break;
            }

            let attempt = self.config.probe_timeout.min(remaining);
            let outcome = self.probe.check(&check, attempt).await;
            let now = self.clock.epoch_ms();
            let _ = self.registry.update(name, |r| r.last_health_check_ms = Some(now));

            match outcome {
                ProbeOutcome::Healthy => {
                    if self.registry.transition(name, WorkerState::Healthy).unwrap_or(false) {
                        info!(worker = %name, waited = ?started.elapsed(), "healthy");
                        return StartResult::Started;
                    }
                    // Transition refused: the worker died under us.
                    return StartResult::SpawnFailed {
                        error: "worker exited before becoming healthy".to_string(),
                    };
                }
                ProbeOutcome::Unhealthy { .. } => {}
                ProbeOutcome::Error { reason } => {
                    warn!(worker = %name, %reason, "health check misconfigured");
                    let _ = self.registry.transition(name, WorkerState::Failed);
                    return StartResult::ProbeMisconfigured { reason };
                }
            }

            let pause = self.config.health_poll_interval.min(
                start_timeout.saturating_sub(started.elapsed()),
            );
            tokio::select! {
                _ = cancel.cancelled() => {
                    // In-flight spawn completes; the gate is abandoned with
                    // the worker left Starting.
                    warn!(worker = %name, "start cancelled while waiting for health");
                    return StartResult::Skipped;
                }
                _ = tokio::time::sleep(pause) => {}
            }
        }

        let waited = started.elapsed();
        warn!(worker = %name, ?waited, "never became healthy; marked failed, left running");
        let _ = self.registry.transition(name, WorkerState::Failed);
        StartResult::HealthTimeout { waited }
    }

    /// Publish the worker's exit into the registry when it happens.
    ///
    /// Guarded transitions keep this from racing an in-progress stop: a
    /// stop walk in Stopping owns the terminal transition, and the watcher's
    /// late update is refused.
    fn spawn_exit_watcher(&self, name: WorkerName, handle: Arc<ProcessHandle>) {
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let exit = handle.wait().await;
            let update = registry.update(&name, |r| {
                if r.state.is_active() {
                    r.state = if exit.clean() { WorkerState::Stopped } else { WorkerState::Failed };
                    r.handle = None;
                    r.exit = Some(exit);
                }
            });
            match update {
                Ok(true) => info!(worker = %name, code = ?exit.code, signaled = exit.signaled, "worker exited"),
                Ok(false) => {}
                Err(e) => warn!(worker = %name, error = %e, "failed to record worker exit"),
            }
        });
    }

    async fn stop_walk(
        &self,
        order: &[WorkerName],
        force: bool,
        cancel: &CancellationToken,
    ) -> StopReport {
        let mut report = StopReport::default();
        for name in order {
            if cancel.is_cancelled() {
                report.entries.push((name.clone(), StopOutcome::Skipped));
                continue;
            }
            let outcome = self.stop_worker(name, force).await;
            report.entries.push((name.clone(), outcome));
        }
        report
    }

    /// Stop one worker: graceful terminate, bounded grace wait, forced kill
    /// on expiry, then a liveness re-query before anything is marked Stopped.
    async fn stop_worker(&self, name: &WorkerName, force: bool) -> StopOutcome {
        let Some(record) = self.registry.get(name) else {
            return StopOutcome::NotRunning;
        };
        let Some(handle) = record.handle else {
            // Second stop of the same worker lands here: nothing to signal.
            return StopOutcome::NotRunning;
        };
        if !self.registry.transition(name, WorkerState::Stopping).unwrap_or(false) {
            return StopOutcome::NotRunning;
        }

        let mut escalated = false;
        if force {
            info!(worker = %name, "force stop");
            handle.signal(SignalKind::Kill).await;
        } else {
            info!(worker = %name, grace = ?record.spec.stop_grace_timeout, "stopping");
            handle.signal(SignalKind::Terminate).await;
            if timeout(record.spec.stop_grace_timeout, handle.wait()).await.is_err() {
                warn!(worker = %name, "grace period lapsed, killing");
                escalated = true;
                handle.signal(SignalKind::Kill).await;
            }
        }
        // Bound the post-kill wait, then trust only a fresh liveness query.
        let _ = timeout(KILL_CONFIRM_TIMEOUT, handle.wait()).await;

        if handle.alive().await {
            warn!(worker = %name, handle = %handle.handle_id(), "still present after kill");
            let _ = self.registry.transition(name, WorkerState::Failed);
            return StopOutcome::StillPresent;
        }

        let _ = self.registry.update(name, |r| {
            r.state = WorkerState::Stopped;
            r.handle = None;
        });
        info!(worker = %name, escalated, "stopped");
        StopOutcome::ConfirmedStopped { escalated }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
