// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI help output specs.

use crate::prelude::*;

#[test]
fn no_args_shows_usage_and_exits_two() {
    cli().fails_with(2).stderr_has("Usage:");
}

#[test]
fn help_shows_commands() {
    cli()
        .args(&["--help"])
        .passes()
        .stdout_has("Usage:")
        .stdout_has("start")
        .stdout_has("stop")
        .stdout_has("status")
        .stdout_has("logs")
        .stdout_has("recover");
}

#[test]
fn start_help_shows_usage() {
    cli().args(&["start", "--help"]).passes().stdout_has("Usage:");
}

#[test]
fn stop_help_mentions_force() {
    cli().args(&["stop", "--help"]).passes().stdout_has("--force");
}

#[test]
fn version_shows_version() {
    cli().args(&["--version"]).passes().stdout_has("0.1");
}
