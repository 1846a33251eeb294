// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use muster_core::FakeClock;

fn name(s: &str) -> WorkerName {
    WorkerName::new(s)
}

#[tokio::test]
async fn late_subscriber_gets_replay_then_live_in_order() {
    let router = LogRouter::new(1000);
    let w = name("api");

    for i in 0..100 {
        router.push(&w, format!("line-{}", i));
    }

    let mut rx = router.subscribe(&w);

    // Live lines produced after subscription.
    router.push(&w, "live-0".to_string());
    router.push(&w, "live-1".to_string());

    let mut got = Vec::new();
    for _ in 0..102 {
        got.push(rx.recv().await.unwrap().line);
    }

    let expected: Vec<String> = (0..100)
        .map(|i| format!("line-{}", i))
        .chain(["live-0".to_string(), "live-1".to_string()])
        .collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn ring_buffer_keeps_only_most_recent_lines() {
    let router = LogRouter::new(3);
    let w = name("api");

    for i in 0..5 {
        router.push(&w, format!("l{}", i));
    }

    let tail: Vec<_> = router.tail(&w, None).into_iter().map(|l| l.line).collect();
    assert_eq!(tail, vec!["l2", "l3", "l4"]);
}

#[tokio::test]
async fn tail_respects_since_lines() {
    let router = LogRouter::new(100);
    let w = name("api");
    for i in 0..10 {
        router.push(&w, format!("l{}", i));
    }

    let tail: Vec<_> = router.tail(&w, Some(2)).into_iter().map(|l| l.line).collect();
    assert_eq!(tail, vec!["l8", "l9"]);

    assert!(router.tail(&name("unknown"), None).is_empty());
}

#[tokio::test]
async fn slow_subscriber_drops_but_does_not_block_others() {
    let router = LogRouter::new(8);
    let w = name("api");

    // Subscribe while the ring is empty: channel capacity is LIVE_BUFFER.
    let slow = router.subscribe(&w);
    let mut fast = router.subscribe(&w);

    // Overflow the slow subscriber's channel without draining it.
    for i in 0..(LIVE_BUFFER + 50) {
        router.push(&w, format!("l{}", i));
    }

    // The fast subscriber still sees the earliest lines promptly.
    let first = fast.recv().await.unwrap();
    assert_eq!(first.line, "l0");

    // The slow subscriber's channel holds exactly its capacity; later lines
    // were dropped for it, not for the ring.
    drop(slow);
    let tail = router.tail(&w, None);
    assert_eq!(tail.len(), 8);
}

#[tokio::test]
async fn dropped_subscribers_are_pruned() {
    let router = LogRouter::new(8);
    let w = name("api");

    let rx = router.subscribe(&w);
    drop(rx);

    // Next push prunes the closed channel; harmless either way, but the
    // line still lands in the ring.
    router.push(&w, "after-drop".to_string());
    assert_eq!(router.tail(&w, None).len(), 1);
}

#[tokio::test]
async fn attach_drains_a_stream_into_the_ring() {
    let router = Arc::new(LogRouter::new(100));
    let (tx, rx) = mpsc::channel(16);
    router.attach(name("api"), rx);

    tx.send("from-worker".to_string()).await.unwrap();
    drop(tx);

    // Wait for the drain task to deliver.
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(2);
    loop {
        if !router.tail(&name("api"), None).is_empty() {
            break;
        }
        assert!(std::time::Instant::now() < deadline, "line never arrived");
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    assert_eq!(router.tail(&name("api"), None)[0].line, "from-worker");
}

#[tokio::test]
async fn lines_are_stamped_with_router_clock() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42_000);
    let router = LogRouter::with_clock(10, clock.clone());
    let w = name("api");

    router.push(&w, "a".to_string());
    clock.advance(std::time::Duration::from_secs(1));
    router.push(&w, "b".to_string());

    let tail = router.tail(&w, None);
    assert_eq!(tail[0].ts_ms, 42_000);
    assert_eq!(tail[1].ts_ms, 43_000);
}

#[tokio::test]
async fn sink_dir_mirrors_lines_to_a_per_worker_file() {
    let dir = tempfile::tempdir().unwrap();
    let router = LogRouter::new(10).with_sink_dir(dir.path().join("logs"));
    let w = name("api");

    router.push(&w, "first".to_string());
    router.push(&w, "second".to_string());

    let path = router.sink_path(&w).unwrap();
    let content = std::fs::read_to_string(path).unwrap();
    assert_eq!(content, "first\nsecond\n");
}

#[tokio::test]
async fn sink_survives_interleaved_pushes_and_subscribers() {
    let dir = tempfile::tempdir().unwrap();
    let router = LogRouter::new(10).with_sink_dir(dir.path().join("logs"));
    let (a, b) = (name("api"), name("db"));

    // The sink file leaves the router state during each write; interleaved
    // pushes and a mid-stream subscribe must still see every line.
    router.push(&a, "a-1".to_string());
    router.push(&b, "b-1".to_string());
    let mut rx = router.subscribe(&a);
    router.push(&a, "a-2".to_string());
    router.push(&b, "b-2".to_string());

    assert_eq!(std::fs::read_to_string(router.sink_path(&a).unwrap()).unwrap(), "a-1\na-2\n");
    assert_eq!(std::fs::read_to_string(router.sink_path(&b).unwrap()).unwrap(), "b-1\nb-2\n");
    assert_eq!(rx.recv().await.unwrap().line, "a-1");
    assert_eq!(rx.recv().await.unwrap().line, "a-2");
}
