//! Run command handler.
//!
//! Starts the payload, prints every status change until Ctrl-C, then stops
//! it. This is the CLI counterpart of the start button, the status label and
//! the stop button.

use std::sync::Arc;

use anyhow::{Context, Result};
use jarstarter_core::StatusSnapshot;
use jarstarter_runtime::system::address_label;
use jarstarter_runtime::{ChannelDispatcher, LaunchError, Launcher};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext, no_provision: bool) -> Result<()> {
    let (dispatcher, mut updates) = ChannelDispatcher::channel();
    let launcher = ctx.launcher(Arc::new(dispatcher));

    println!("Address: {}", address_label(ctx.settings.health_port).await);

    let started = start(&launcher, no_provision).await;
    drain(&mut updates);
    let outcome = started.context("Failed to start")?;
    info!(pid = outcome.pid(), "Payload launched");

    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(snapshot) => print_status(&snapshot),
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                println!("Stopping...");
                break;
            }
        }
    }

    let stopped = launcher.stop().await;
    drain(&mut updates);
    stopped.context("Failed to stop cleanly")?;
    Ok(())
}

async fn start(
    launcher: &Launcher,
    no_provision: bool,
) -> Result<jarstarter_core::StartOutcome, LaunchError> {
    if !no_provision {
        return launcher.start().await;
    }

    let provisioner = launcher.provisioner();
    Ok(launcher
        .supervisor()
        .start(
            &provisioner.runtime_executable(),
            &provisioner.payload_path(),
            &launcher.paths().work_dir,
        )
        .await?)
}

fn drain(updates: &mut UnboundedReceiver<StatusSnapshot>) {
    while let Ok(snapshot) = updates.try_recv() {
        print_status(&snapshot);
    }
}

fn print_status(snapshot: &StatusSnapshot) {
    println!(
        "[{}] {}",
        snapshot.updated_at.format("%H:%M:%S"),
        snapshot.display_label()
    );
}
