//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use meetsync_core::ProviderKind;

/// meetsync - one calendar view across Google and Microsoft accounts
#[derive(Debug, Parser)]
#[command(name = "meetsync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "MEETSYNC_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the providers a user has linked
    Linked {
        /// User id
        #[arg(long, short)]
        user: i64,
    },

    /// List a user's events across all linked providers
    Events {
        #[arg(long, short)]
        user: i64,

        /// Skip all-day events
        #[arg(long)]
        skip_all_day: bool,

        /// Maximum number of events to print
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a user's hourly free/busy grid in local time
    Availability {
        #[arg(long, short)]
        user: i64,

        /// Number of days starting today
        #[arg(long, default_value = "14")]
        days: u32,
    },

    /// Manage stored credentials
    Credential {
        #[command(subcommand)]
        action: CredentialAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum CredentialAction {
    /// Store a credential from a JSON token file
    ///
    /// The file holds at least `access_token`; `refresh_token`, `expires_at`
    /// (RFC 3339) and `scopes` are optional.
    Import {
        #[arg(long, short)]
        user: i64,

        /// google or microsoft
        #[arg(long, short)]
        provider: ProviderKind,

        /// Token file to import
        file: PathBuf,
    },

    /// Forget a stored credential
    Remove {
        #[arg(long, short)]
        user: i64,

        #[arg(long, short)]
        provider: ProviderKind,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Check that provider settings and secrets resolve
    Validate,

    /// Show configuration and credential file paths
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_availability() {
        let cli = Cli::try_parse_from(["meetsync", "availability", "-u", "7", "--days", "3", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Availability { user: 7, days: 3 }));
    }

    #[test]
    fn parses_credential_import() {
        let cli = Cli::try_parse_from([
            "meetsync", "credential", "import", "--user", "1", "--provider", "Microsoft", "token.json",
        ])
        .unwrap();
        match cli.command {
            Command::Credential {
                action: CredentialAction::Import { user, provider, file },
            } => {
                assert_eq!(user, 1);
                assert_eq!(provider, ProviderKind::Microsoft);
                assert_eq!(file, PathBuf::from("token.json"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_provider() {
        let result = Cli::try_parse_from(["meetsync", "credential", "remove", "-u", "1", "-p", "yahoo"]);
        assert!(result.is_err());
    }
}
