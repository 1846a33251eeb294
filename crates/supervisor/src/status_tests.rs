// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::process::ProcessHandle;
use crate::registry::RuntimeRecord;
use muster_core::SystemClock;
use std::net::TcpListener;
use std::sync::Arc;

async fn running_record(spec: &muster_core::WorkerSpec) -> RuntimeRecord {
    let handle = ProcessHandle::spawn(spec).await.unwrap();
    RuntimeRecord {
        spec: spec.clone(),
        state: WorkerState::Healthy,
        handle: Some(Arc::new(handle)),
        started_at_ms: Some(SystemClock.epoch_ms().saturating_sub(5_000)),
        last_health_check_ms: None,
        consecutive_failures: 0,
        exit: None,
    }
}

#[tokio::test]
async fn stopped_workers_report_without_probing() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::parse(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        [worker.health_check]
        type = "tcp_port"
        port = 1
        "#,
    )
    .unwrap();
    let registry = Registry::open(dir.path()).unwrap();

    let out = report(
        &manifest,
        &registry,
        &Probe::new(),
        Duration::from_millis(200),
        Duration::from_secs(1),
    )
    .await;

    let row = out.get("svc").unwrap();
    assert_eq!(row.state, WorkerState::Stopped);
    assert_eq!(row.probe, None);
    assert_eq!(row.uptime_ms, None);
    assert_eq!(row.handle_id, None);
}

#[tokio::test]
async fn running_worker_gets_a_fresh_probe_and_uptime() {
    let dir = tempfile::tempdir().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let manifest = Manifest::parse(&format!(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        [worker.health_check]
        type = "tcp_port"
        port = {port}
        "#
    ))
    .unwrap();

    let registry = Registry::open(dir.path()).unwrap();
    let record = running_record(&manifest.workers[0]).await;
    let handle = record.handle.clone().unwrap();
    registry.upsert(record).unwrap();

    let out = report(
        &manifest,
        &registry,
        &Probe::new(),
        Duration::from_millis(500),
        Duration::from_secs(2),
    )
    .await;

    let row = out.get("svc").unwrap();
    assert_eq!(row.state, WorkerState::Healthy);
    assert_eq!(row.probe, Some(ProbeStatus::Healthy));
    assert_eq!(row.kind, "process");
    assert!(row.uptime_ms.unwrap() >= 5_000);
    assert_eq!(row.handle_id.as_deref(), Some(handle.handle_id().as_str()));

    handle.signal(crate::process::SignalKind::Kill).await;
}

#[tokio::test]
async fn slow_probe_degrades_its_row_not_the_report() {
    let dir = tempfile::tempdir().unwrap();

    // TEST-NET-1 blackholes the connect; the probe would hang for its full
    // per-attempt timeout, well past the report deadline.
    let manifest = Manifest::parse(
        r#"
        [[worker]]
        name = "slow"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        [worker.health_check]
        type = "http_get"
        url = "http://192.0.2.1:81/health"

        [[worker]]
        name = "plain"
        kind = "process"
        command = "/bin/sleep"
        args = ["30"]
        "#,
    )
    .unwrap();

    let registry = Registry::open(dir.path()).unwrap();
    let slow = running_record(&manifest.workers[0]).await;
    let plain = running_record(&manifest.workers[1]).await;
    let handles = [slow.handle.clone().unwrap(), plain.handle.clone().unwrap()];
    registry.upsert(slow).unwrap();
    registry.upsert(plain).unwrap();

    let started = std::time::Instant::now();
    let out = report(
        &manifest,
        &registry,
        &Probe::new(),
        Duration::from_secs(5),
        Duration::from_millis(300),
    )
    .await;
    assert!(started.elapsed() < Duration::from_secs(2), "deadline must bound the report");

    assert_eq!(out.get("slow").unwrap().probe, Some(ProbeStatus::DeadlineExceeded));
    // No health check configured: running is the whole story.
    assert_eq!(out.get("plain").unwrap().probe, None);
    assert_eq!(out.get("plain").unwrap().state, WorkerState::Healthy);

    for handle in handles {
        handle.signal(crate::process::SignalKind::Kill).await;
    }
}

#[tokio::test]
async fn report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = Manifest::parse(
        r#"
        [[worker]]
        name = "svc"
        kind = "process"
        command = "/bin/true"
        "#,
    )
    .unwrap();
    let registry = Registry::open(dir.path()).unwrap();

    let out = report(
        &manifest,
        &registry,
        &Probe::new(),
        Duration::from_millis(100),
        Duration::from_millis(500),
    )
    .await;

    let json = serde_json::to_value(&out).unwrap();
    let row = &json["workers"][0];
    assert_eq!(row["name"], "svc");
    assert_eq!(row["state"], "stopped");
    assert_eq!(row["kind"], "process");
    // Absent optionals are omitted, not null.
    assert!(row.get("probe").is_none());
}
