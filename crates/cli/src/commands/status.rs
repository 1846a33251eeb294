// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster status` - aggregated fleet report.

use crate::exit_error::ExitError;
use crate::output;
use muster_supervisor::Controller;

pub async fn run(controller: &Controller, name: Option<&str>, json: bool) -> Result<(), ExitError> {
    super::recover_quietly(controller).await?;

    let mut report = controller.status().await;
    match name {
        None | Some("all") => {}
        Some(n) => {
            if controller.manifest().get(n).is_none() {
                return Err(ExitError::new(1, format!("unknown worker '{}'", n)));
            }
            report.workers.retain(|w| w.name == *n);
        }
    }

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| ExitError::new(1, e.to_string()))?;
        println!("{}", rendered);
    } else {
        output::print_status_table(&report);
    }
    Ok(())
}
