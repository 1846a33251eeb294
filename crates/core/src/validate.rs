// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Character allow-list validation for launch invocations.
//!
//! Commands are always spawned as discrete argument vectors, never through a
//! shell, and every string in the vector must pass this allow-list before it
//! is accepted. Rejection happens at manifest load, before any worker is
//! touched.

use crate::spec::WorkerSpec;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    #[error("worker '{worker}': {field} is empty")]
    Empty { worker: String, field: String },
    #[error("worker '{worker}': {field} contains disallowed character {ch:?} in {value:?}")]
    DisallowedCharacter { worker: String, field: String, value: String, ch: char },
}

/// Characters permitted in commands, arguments and environment values.
///
/// Alphanumerics plus a small punctuation set sufficient for paths, URLs,
/// flags and key=value pairs. Notably absent: quotes, backticks, `$`, `;`,
/// `|`, `&`, `<`, `>`, and control characters.
fn allowed(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(ch, '-' | '_' | '.' | '/' | '=' | ':' | '@' | '+' | ',' | '%' | '#' | '~' | ' ')
}

/// Validate a single argument string against the allow-list.
pub fn validate_arg(worker: &str, field: &str, value: &str) -> Result<(), ValidateError> {
    if let Some(ch) = value.chars().find(|c| !allowed(*c)) {
        return Err(ValidateError::DisallowedCharacter {
            worker: worker.to_string(),
            field: field.to_string(),
            value: value.to_string(),
            ch,
        });
    }
    Ok(())
}

/// Validate every launch string in a worker spec: command, args,
/// environment values, and the container image when present.
pub fn validate_spec_strings(spec: &WorkerSpec) -> Result<(), ValidateError> {
    let worker = spec.name.as_str();
    if spec.command.is_empty() {
        return Err(ValidateError::Empty {
            worker: worker.to_string(),
            field: "command".to_string(),
        });
    }
    validate_arg(worker, "command", &spec.command)?;
    for (i, arg) in spec.args.iter().enumerate() {
        validate_arg(worker, &format!("args[{}]", i), arg)?;
    }
    for (key, value) in &spec.env {
        validate_arg(worker, &format!("env.{}", key), value)?;
    }
    if let crate::spec::WorkerKind::Container { image } = &spec.kind {
        if image.is_empty() {
            return Err(ValidateError::Empty {
                worker: worker.to_string(),
                field: "image".to_string(),
            });
        }
        validate_arg(worker, "image", image)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
