// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Integration specs run against the `muster` binary.

mod prelude;

mod cli {
    mod errors;
    mod help;
}

mod fleet {
    mod lifecycle;
    mod logs;
    mod recovery;
}
