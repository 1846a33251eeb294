// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster stop` - tear workers down in reverse dependency order.

use crate::exit_error::ExitError;
use crate::output;
use muster_core::WorkerName;
use muster_supervisor::Controller;

pub async fn run(controller: &Controller, name: Option<&str>, force: bool) -> Result<(), ExitError> {
    super::recover_quietly(controller).await?;
    let cancel = super::interrupt_token();

    let report = match name {
        None | Some("all") => controller.stop_all(force, &cancel).await,
        Some(n) => controller.stop_one(&WorkerName::new(n), force, &cancel).await?,
    };

    output::print_stop_report(&report);
    if report.all_stopped() {
        Ok(())
    } else {
        Err(ExitError::new(1, "one or more workers could not be stopped"))
    }
}
