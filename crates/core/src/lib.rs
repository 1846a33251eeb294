// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! muster-core: domain types for the muster service supervisor

pub mod clock;
pub mod duration;
pub mod name;
pub mod spec;
pub mod state;
pub mod validate;

pub use clock::{Clock, FakeClock, SystemClock};
pub use duration::parse_duration;
pub use name::WorkerName;
pub use spec::{HealthCheck, WorkerKind, WorkerSpec};
pub use state::WorkerState;
pub use validate::{validate_arg, validate_spec_strings, ValidateError};
