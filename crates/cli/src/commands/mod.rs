// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod logs;
pub mod recover;
pub mod restart;
pub mod run;
pub mod start;
pub mod status;
pub mod stop;

use crate::exit_error::ExitError;
use muster_supervisor::Controller;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Adopt whatever a previous invocation left running, so every one-shot
/// command acts on reality instead of an empty in-memory registry.
pub(crate) async fn recover_quietly(controller: &Controller) -> Result<(), ExitError> {
    let report = controller.recover().await?;
    debug!(
        adopted = report.adopted.len(),
        discarded = report.discarded.len(),
        "pre-command recovery"
    );
    Ok(())
}

/// A token cancelled by Ctrl-C, so an interrupted walk finishes its
/// in-flight step and abandons the rest.
pub(crate) fn interrupt_token() -> CancellationToken {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_interrupt.cancel();
        }
    });
    cancel
}
