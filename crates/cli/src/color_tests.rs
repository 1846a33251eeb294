// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn no_color_disables_colorizing() {
    std::env::set_var("NO_COLOR", "1");
    assert!(!should_colorize());
    assert_eq!(header("NAME"), "NAME");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn color_env_forces_colorizing() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
    assert!(should_colorize());
    assert!(header("NAME").contains("NAME"));
    std::env::remove_var("COLOR");
}
