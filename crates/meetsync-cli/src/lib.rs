//! The `meetsync` command-line interface.
//!
//! Reads provider settings from `config.toml`, keeps credentials in a
//! file-backed store and exposes the aggregation and availability views of
//! a single user.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod secret;

pub use cli::Cli;
pub use error::{CliError, CliResult};
