// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster start` - bring workers up in dependency order.

use crate::exit_error::ExitError;
use crate::output;
use muster_core::WorkerName;
use muster_supervisor::Controller;

pub async fn run(controller: &Controller, name: Option<&str>) -> Result<(), ExitError> {
    super::recover_quietly(controller).await?;
    let cancel = super::interrupt_token();

    let report = match name {
        None | Some("all") => controller.start_all(&cancel).await,
        Some(n) => controller.start_one(&WorkerName::new(n), &cancel).await?,
    };

    output::print_start_report(&report);
    if report.all_ok() {
        Ok(())
    } else {
        Err(ExitError::new(1, "one or more workers failed to start"))
    }
}
