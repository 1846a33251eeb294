// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one spawn attempt.
///
/// Stopped and Failed are terminal for an attempt; a fresh `start` creates a
/// new runtime record for the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Stopped,
    Starting,
    Healthy,
    Degraded,
    Stopping,
    Failed,
}

impl WorkerState {
    /// True for states that hold a live process or container.
    ///
    /// At most one active record may exist per worker name.
    pub fn is_active(self) -> bool {
        matches!(self, WorkerState::Starting | WorkerState::Healthy | WorkerState::Degraded)
    }

    /// True for states that end a spawn attempt.
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkerState::Stopped | WorkerState::Failed)
    }

    /// Whether the state machine permits moving to `next`.
    pub fn can_transition_to(self, next: WorkerState) -> bool {
        use WorkerState::*;
        match (self, next) {
            (Stopped, Starting) | (Failed, Starting) => true,
            (Starting, Healthy) | (Starting, Failed) => true,
            (Healthy, Degraded) => true,
            (Degraded, Healthy) | (Degraded, Failed) => true,
            (Starting, Stopping) | (Healthy, Stopping) | (Degraded, Stopping) => true,
            // A worker that failed its health gate is left running and must
            // still be stoppable.
            (Failed, Stopping) => true,
            (Stopping, Stopped) | (Stopping, Failed) => true,
            // Exit watchers may observe death from any live state.
            (Starting, Stopped) | (Healthy, Stopped) | (Degraded, Stopped) => true,
            (Healthy, Failed) => true,
            _ => false,
        }
    }
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkerState::Stopped => "stopped",
            WorkerState::Starting => "starting",
            WorkerState::Healthy => "healthy",
            WorkerState::Degraded => "degraded",
            WorkerState::Stopping => "stopping",
            WorkerState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
