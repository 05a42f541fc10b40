//! Address command handler.

use anyhow::Result;
use jarstarter_runtime::system::address_label;

use crate::bootstrap::CliContext;

pub async fn execute(ctx: &CliContext) -> Result<()> {
    println!("{}", address_label(ctx.settings.health_port).await);
    Ok(())
}
