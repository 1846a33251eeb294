// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use muster_supervisor::SupervisorError;
use std::fmt;

#[derive(Debug)]
pub struct ExitError {
    pub code: u8,
    pub message: String,
}

impl ExitError {
    pub fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

impl From<SupervisorError> for ExitError {
    fn from(err: SupervisorError) -> Self {
        // Configuration problems exit 2; anything hit while driving
        // workers exits 1.
        let code = match &err {
            SupervisorError::Manifest(_) => 2,
            _ => 1,
        };
        ExitError::new(code, err.to_string())
    }
}
