// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Start/stop lifecycle specs across one-shot invocations: each command is
//! a fresh process that must adopt what the previous one left behind.

use crate::prelude::*;

#[test]
fn start_status_stop_round_trip() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "db"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]

        [[worker]]
        name = "api"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        depends_on = ["db"]
        "#,
    );

    let out = fleet.muster().args(&["start"]).passes().stdout();
    assert!(out.find("db").unwrap() < out.find("api").unwrap(), "db must start first:\n{}", out);

    fleet
        .muster()
        .args(&["status"])
        .passes()
        .stdout_has("healthy");

    let out = fleet.muster().args(&["stop"]).passes().stdout();
    assert!(out.find("api").unwrap() < out.find("db").unwrap(), "api must stop first:\n{}", out);

    fleet.muster().args(&["status"]).passes().stdout_has("stopped");
}

#[test]
fn start_fails_fast_and_skips_dependents() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "bad"
        kind = "process"
        command = "/nonexistent-command-for-test"

        [[worker]]
        name = "next"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        depends_on = ["bad"]
        "#,
    );

    fleet
        .muster()
        .args(&["start"])
        .fails_with(1)
        .stdout_has("spawn failed")
        .stdout_has("skipped");
}

#[test]
fn stop_is_idempotent_across_invocations() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        "#,
    );

    fleet.muster().args(&["start"]).passes();
    fleet.muster().args(&["stop"]).passes().stdout_has("stopped");
    fleet.muster().args(&["stop"]).passes().stdout_has("not running");
}

#[test]
fn stop_escalates_a_worker_that_ignores_terminate() {
    let fleet = Fleet::new("");
    let script = fleet.file("stubborn.sh", "trap : TERM\nsleep 30\n");
    fleet.file(
        "muster.toml",
        &format!(
            r#"
            [[worker]]
            name = "stubborn"
            kind = "process"
            command = "/bin/sh"
            args = ["{}"]
            stop_grace_timeout = "300ms"
            "#,
            script.display()
        ),
    );

    fleet.muster().args(&["start"]).passes();
    fleet.muster().args(&["stop"]).passes().stdout_has("stopped (killed)");
}

#[test]
fn status_json_is_machine_readable() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        "#,
    );

    fleet.muster().args(&["start"]).passes();
    let out = fleet.muster().args(&["status", "--json"]).passes().stdout();
    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    let row = &report["workers"][0];
    assert_eq!(row["name"], "svc");
    assert_eq!(row["state"], "healthy");
    assert_eq!(row["kind"], "process");
    assert!(row["handle_id"].is_string());

    fleet.muster().args(&["stop"]).passes();
}
