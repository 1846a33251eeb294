// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log routing specs, driven through `muster run` so a resident supervisor
//! is draining worker output while we query it.

use crate::prelude::*;
use std::time::{Duration, Instant};

fn wait_for(path: &std::path::Path, needle: &str, timeout: Duration) {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if let Ok(content) = std::fs::read_to_string(path) {
            if content.contains(needle) {
                return;
            }
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    panic!("'{}' never appeared in {}", needle, path.display());
}

fn interrupt(pid: u32) {
    let status = std::process::Command::new("/bin/kill")
        .args(["-INT", &pid.to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

#[test]
fn run_drains_worker_output_and_logs_reads_it_back() {
    let fleet = Fleet::new("");
    let script = fleet.file("chatty.sh", "echo ready\necho serving requests\nsleep 30\n");
    fleet.file(
        "muster.toml",
        &format!(
            r#"
            [[worker]]
            name = "chatty"
            kind = "process"
            command = "/bin/sh"
            args = ["{}"]
            "#,
            script.display()
        ),
    );

    let mut supervisor = fleet
        .muster_raw(&["run"])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    // The resident supervisor mirrors output into the sink file.
    wait_for(&fleet.sink_file("chatty"), "serving requests", Duration::from_secs(10));

    fleet
        .muster()
        .args(&["logs", "chatty"])
        .passes()
        .stdout_has("ready")
        .stdout_has("serving requests");

    // Only the most recent lines when -n is small.
    let out = fleet.muster().args(&["logs", "chatty", "-n", "1"]).passes().stdout();
    assert!(!out.contains("ready"), "tail -n 1 should drop older lines:\n{}", out);
    assert!(out.contains("serving requests"), "{}", out);

    // Ctrl-C tears the fleet down gracefully.
    interrupt(supervisor.id());
    let status = supervisor.wait().unwrap();
    assert!(status.success(), "muster run should exit cleanly, got {:?}", status);

    fleet.muster().args(&["status"]).passes().stdout_has("stopped");
}
