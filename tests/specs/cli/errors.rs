// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration errors exit 2 before any worker is touched; runtime
//! failures exit 1.

use crate::prelude::*;

#[test]
fn missing_manifest_exits_two() {
    cli().args(&["-f", "/nonexistent/muster.toml", "status"]).fails_with(2).stderr_has("error:");
}

#[test]
fn dependency_cycle_exits_two() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        depends_on = ["b"]

        [[worker]]
        name = "b"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        depends_on = ["a"]
        "#,
    );
    fleet.muster().args(&["start"]).fails_with(2).stderr_has("cycle");
}

#[test]
fn unknown_dependency_exits_two() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        depends_on = ["ghost"]
        "#,
    );
    fleet.muster().args(&["start"]).fails_with(2).stderr_has("unknown");
}

#[test]
fn duplicate_worker_exits_two() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]

        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        "#,
    );
    fleet.muster().args(&["status"]).fails_with(2).stderr_has("duplicate");
}

#[test]
fn unrecognized_kind_exits_two() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "vm"
        command = "/bin/sleep"
        "#,
    );
    fleet.muster().args(&["status"]).fails_with(2);
}

#[test]
fn shell_metacharacters_in_args_exit_two() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/sh"
        args = ["-c", "rm -rf /; echo pwned"]
        "#,
    );
    fleet.muster().args(&["start"]).fails_with(2).stderr_has("disallowed");
}

#[test]
fn empty_manifest_exits_two() {
    let fleet = Fleet::new("");
    fleet.muster().args(&["status"]).fails_with(2).stderr_has("no workers");
}

#[test]
fn unknown_worker_name_exits_one() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "a"
        kind = "process"
        command = "/bin/true"
        "#,
    );
    fleet.muster().args(&["start", "ghost"]).fails_with(1).stderr_has("unknown worker");
    fleet.muster().args(&["logs", "ghost"]).fails_with(1).stderr_has("unknown worker");
}
