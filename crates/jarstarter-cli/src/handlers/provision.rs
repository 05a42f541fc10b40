//! Provision command handler.

use anyhow::Result;
use tracing::info;

use crate::bootstrap::CliContext;

/// Extract the runtime and payload, reporting what was done.
pub fn execute(ctx: &CliContext) -> Result<()> {
    let (runtime, payload) = ctx.provisioner().provision_all()?;

    let action = if runtime.extracted { "extracted" } else { "already present" };
    println!("runtime ({action}): {}", runtime.executable_path.display());
    println!("payload ({}): {}", payload.source, payload.artifact_path.display());

    info!(
        runtime = %runtime.executable_path.display(),
        payload = %payload.artifact_path.display(),
        "Provisioning complete"
    );
    Ok(())
}
