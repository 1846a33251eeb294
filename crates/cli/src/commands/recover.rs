// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster recover` - re-attach to workers a previous supervisor left
//! running and discard stale records.

use crate::exit_error::ExitError;
use crate::output;
use muster_supervisor::Controller;

pub async fn run(controller: &Controller) -> Result<(), ExitError> {
    let report = controller.recover().await?;
    output::print_recover_report(&report);
    Ok(())
}
