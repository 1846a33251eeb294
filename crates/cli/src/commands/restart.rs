// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster restart` - stop a worker (dependents first), start it back up.

use crate::exit_error::ExitError;
use crate::output;
use muster_core::WorkerName;
use muster_supervisor::Controller;

pub async fn run(controller: &Controller, name: &str) -> Result<(), ExitError> {
    super::recover_quietly(controller).await?;
    let cancel = super::interrupt_token();

    let report = controller.restart(&WorkerName::new(name), &cancel).await?;
    output::print_stop_report(&report.stop);
    output::print_start_report(&report.start);

    if report.stop.all_stopped() && report.start.all_ok() {
        Ok(())
    } else {
        Err(ExitError::new(1, format!("restart of '{}' did not complete cleanly", name)))
    }
}
