// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashMap;

#[test]
fn display_matches_inner_string() {
    let name = WorkerName::new("api-server");
    assert_eq!(name.to_string(), "api-server");
    assert_eq!(name.as_str(), "api-server");
}

#[test]
fn equality_against_str() {
    let name = WorkerName::from("scheduler");
    assert_eq!(name, "scheduler");
    assert_eq!(name, *"scheduler");
}

#[test]
fn borrow_allows_str_keyed_lookup() {
    let mut map: HashMap<WorkerName, u32> = HashMap::new();
    map.insert(WorkerName::new("metrics"), 1);
    assert_eq!(map.get("metrics"), Some(&1));
}

#[test]
fn serde_roundtrip_is_transparent() {
    let name = WorkerName::new("dash");
    let json = serde_json::to_string(&name).unwrap();
    assert_eq!(json, "\"dash\"");
    let back: WorkerName = serde_json::from_str(&json).unwrap();
    assert_eq!(back, name);
}
