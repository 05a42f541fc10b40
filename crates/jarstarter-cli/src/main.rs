//! CLI entry point - the composition root.

use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use jarstarter_cli::{Cli, CliConfig, Commands, bootstrap, exit_code, handlers, init_tracing};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.command.is_none() {
        Cli::command().print_help()?;
        return Ok(());
    }

    let ctx = bootstrap(&CliConfig::from_cli(&cli))?;
    let _guard = init_tracing(&ctx.paths.log_file(), cli.verbose)?;

    let Some(command) = cli.command else {
        return Ok(());
    };

    match command {
        Commands::Run { no_provision } => handlers::run::execute(&ctx, no_provision).await?,
        Commands::Provision => handlers::provision::execute(&ctx)?,
        Commands::Paths => handlers::paths::execute(&ctx)?,
        Commands::Config => handlers::config::execute(&ctx)?,
        Commands::Address => handlers::address::execute(&ctx).await?,
        Commands::Logs { tail, export } => {
            handlers::logs::execute(&ctx, tail, export.as_deref())?;
        }
    }

    Ok(())
}
