//! CLI error types.

use meetsync_core::{TracingError, UnknownProvider};
use meetsync_providers::{CredentialStoreError, ProviderError, RegistryError};
use meetsync_service::ServiceError;
use thiserror::Error;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid credential file {path}: {source}")]
    CredentialFile {
        path: std::path::PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    #[error(transparent)]
    CredentialStore(#[from] CredentialStoreError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Tracing(#[from] TracingError),

    #[error("failed to render output: {0}")]
    Render(String),
}
