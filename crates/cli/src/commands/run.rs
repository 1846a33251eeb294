// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `muster run` - foreground supervision: bring the fleet up, sweep health
//! until interrupted, then tear it down gracefully.

use crate::exit_error::ExitError;
use crate::output;
use muster_supervisor::Controller;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub async fn run(controller: &Controller) -> Result<(), ExitError> {
    super::recover_quietly(controller).await?;
    let interrupt = super::interrupt_token();

    let report = controller.start_all(&interrupt).await;
    output::print_start_report(&report);
    if !report.all_ok() {
        // Partial fleets are not supervised; undo what came up.
        let stop = controller.stop_all(false, &CancellationToken::new()).await;
        output::print_stop_report(&stop);
        return Err(ExitError::new(1, "fleet failed to start"));
    }

    println!("fleet up; Ctrl-C to stop");
    let mut sweep =
        tokio::time::interval(controller.manifest().supervisor.health_poll_interval);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interrupt.cancelled() => break,
            _ = sweep.tick() => {
                if let Err(e) = controller.health_sweep().await {
                    warn!(error = %e, "health sweep failed");
                }
            }
        }
    }

    // Teardown is never cancelled by the interrupt that requested it.
    let report = controller.stop_all(false, &CancellationToken::new()).await;
    output::print_stop_report(&report);
    if report.all_stopped() {
        Ok(())
    } else {
        Err(ExitError::new(1, "one or more workers could not be stopped"))
    }
}
