//! Paths command handler.
//!
//! Displays all resolved paths for diagnostics, in `key = value` format.

use anyhow::Result;

use crate::bootstrap::CliContext;

pub fn execute(ctx: &CliContext) -> Result<()> {
    let paths = &ctx.paths;
    let rows = [
        ("data_root", paths.data_root.clone()),
        ("resource_root", paths.resource_root.clone()),
        ("runtime_bundle", paths.runtime_bundle_dir()),
        ("payload_bundle", paths.payload_bundle_dir()),
        ("runtime_dir", paths.runtime_dir.clone()),
        ("payload", paths.payload_file(&ctx.settings.payload_file_name)),
        ("work_dir", paths.work_dir.clone()),
        ("log_file", paths.log_file()),
        ("config_file", paths.config_file()),
    ];
    for (key, value) in rows {
        println!("{key:<15} = {}", value.display());
    }
    Ok(())
}
