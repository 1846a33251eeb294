// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery specs: a fresh supervisor adopts live workers from on-disk
//! records and discards stale ones instead of trusting them.

use crate::prelude::*;
use std::time::Duration;

#[test]
fn recover_adopts_workers_left_running() {
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

    // A different process over the same state dir re-attaches.
    fleet.muster().args(&["recover"]).passes().stdout_has("adopted");
    fleet.muster().args(&["status"]).passes().stdout_has("healthy");

    fleet.muster().args(&["stop"]).passes();
    fleet.muster().args(&["recover"]).passes().stdout_has("nothing to recover");
}

#[test]
fn recover_discards_records_of_dead_workers() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "brief"
        kind = "process"
        command = "/bin/sleep"
        args = ["0.2"]
        "#,
    );

    fleet.muster().args(&["start"]).passes();

    // The worker exits on its own after the supervisor is gone.
    std::thread::sleep(Duration::from_millis(700));

    fleet.muster().args(&["recover"]).passes().stdout_has("discarded");
    fleet.muster().args(&["status"]).passes().stdout_has("stopped");
}

#[test]
fn double_start_across_invocations_is_a_noop() {
    let fleet = Fleet::new(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        "#,
    );

    fleet.muster().args(&["start"]).passes().stdout_has("started");
    fleet.muster().args(&["start"]).passes().stdout_has("already running");

    fleet.muster().args(&["stop"]).passes();
}
