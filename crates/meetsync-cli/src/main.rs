//! meetsync CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use meetsync_core::{TracingConfig, UserId, init_tracing};
use tracing::Level;

use meetsync_cli::cli::{Cli, Command, ConfigAction, CredentialAction};
use meetsync_cli::commands::{self, events::EventFilter};
use meetsync_cli::config::CliConfig;
use meetsync_cli::error::CliResult;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = if cli.debug {
        TracingConfig::cli_debug()
    } else {
        TracingConfig::cli_debug().with_level(Level::WARN)
    };
    if let Err(e) = init_tracing(logging) {
        eprintln!("warning: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => CliConfig::load_from(path)?,
        None => CliConfig::load()?,
    };

    match cli.command {
        Command::Linked { user } => commands::linked::run(&config, UserId(user), cli.json).await,
        Command::Events {
            user,
            skip_all_day,
            limit,
        } => {
            let filter = EventFilter { skip_all_day, limit };
            commands::events::run(&config, UserId(user), filter, cli.json).await
        }
        Command::Availability { user, days } => {
            commands::availability::run(&config, UserId(user), days, cli.json).await
        }
        Command::Credential { action } => match action {
            CredentialAction::Import {
                user,
                provider,
                file,
            } => commands::credential::import(&config, UserId(user), provider, &file).await,
            CredentialAction::Remove { user, provider } => {
                commands::credential::remove(&config, UserId(user), provider).await
            }
        },
        Command::Config { action } => match action {
            ConfigAction::Validate => commands::config::validate(&config),
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
