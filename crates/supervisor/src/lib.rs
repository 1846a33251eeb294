// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster-supervisor: process/container lifecycle, health gating, dependency
//! ordering, graceful-then-forced termination, and status aggregation.
//!
//! The [`Controller`] is the orchestration entry point; everything else is a
//! building block it composes: [`Probe`] (point-in-time health checks),
//! [`ProcessHandle`] (one spawned or adopted worker), [`Registry`] (the
//! single source of truth, persisted per mutation), [`LogRouter`] (output
//! fan-out with replay), and the status aggregator.

pub mod controller;
pub mod error;
pub mod logs;
pub mod probe;
pub mod process;
pub mod registry;
pub mod statefile;
pub mod status;

pub use controller::{
    Controller, RestartReport, StartReport, StartResult, StopOutcome, StopReport,
};
pub use error::{SpawnError, StateError, SupervisorError};
pub use logs::{LogLine, LogRouter};
pub use probe::{Probe, ProbeOutcome};
pub use process::{ExitInfo, ProcessHandle, SignalKind};
pub use registry::{RecoverReport, Registry, RuntimeRecord};
pub use statefile::{PersistedWorker, StateStore};
pub use status::{ProbeStatus, StatusReport, WorkerStatus};
