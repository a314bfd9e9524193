// ABOUTME: Entry point for the railyard CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, VariablesAction};
use commands::AppContext;
use railyard::config::{self, Config};
use railyard::error::Result;
use railyard::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        output.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Init { project, force } = &cli.command {
        config::init_config(&cwd, project.as_deref(), *force)?;
        output.success(&format!("Wrote {}", config::CONFIG_FILENAME));
        return Ok(());
    }

    let config = Config::discover(&cwd)?;
    let ctx = AppContext::initialize(config).await?;

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Health => commands::health(&ctx, output).await,
        Commands::Status => commands::status(&ctx, output).await,
        Commands::Deploy { service } => commands::deploy(&ctx, &service, output).await,
        Commands::DeployAll => commands::deploy_all(&ctx, output).await,
        Commands::Redeploy { service } => commands::redeploy(&ctx, &service, output).await,
        Commands::Restart { service } => commands::restart(&ctx, &service, output).await,
        Commands::Rollback {
            service,
            deployment_id,
        } => commands::rollback(&ctx, &service, &deployment_id, output).await,
        Commands::History { service } => commands::history(&ctx, &service, output).await,
        Commands::Variables { action } => match action {
            VariablesAction::List { service } => {
                commands::variables_list(&ctx, &service, output).await
            }
            VariablesAction::Set { service, pairs } => {
                commands::variables_set(&ctx, &service, &pairs, output).await
            }
            VariablesAction::Delete { service, name } => {
                commands::variables_delete(&ctx, &service, &name, output).await
            }
        },
    }
}
