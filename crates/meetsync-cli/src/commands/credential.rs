//! `meetsync credential`

use std::path::Path;

use meetsync_core::{ProviderKind, UserId};
use meetsync_providers::{Credential, CredentialStore, FileCredentialStore};
use tracing::info;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

pub async fn import(config: &CliConfig, user: UserId, provider: ProviderKind, file: &Path) -> CliResult<()> {
    let store = FileCredentialStore::new(config.credentials_path());
    import_into(&store, user, provider, file).await?;
    println!("Stored {} credential for user {user} in {}", provider.display_name(), store.path().display());
    Ok(())
}

pub async fn remove(config: &CliConfig, user: UserId, provider: ProviderKind) -> CliResult<()> {
    let store = FileCredentialStore::new(config.credentials_path());
    if store.remove_credential(user, provider).await? {
        println!("Removed {} credential for user {user}", provider.display_name());
    } else {
        println!("No {} credential stored for user {user}", provider.display_name());
    }
    Ok(())
}

/// Reads a token file and saves it for `(user, provider)`.
pub async fn import_into(
    store: &FileCredentialStore,
    user: UserId,
    provider: ProviderKind,
    file: &Path,
) -> CliResult<Credential> {
    let content = tokio::fs::read_to_string(file)
        .await
        .map_err(|source| CliError::Read {
            path: file.to_path_buf(),
            source,
        })?;
    let credential: Credential =
        serde_json::from_str(&content).map_err(|source| CliError::CredentialFile {
            path: file.to_path_buf(),
            source,
        })?;
    if credential.access_token.trim().is_empty() {
        return Err(CliError::Config(format!("{}: access_token is empty", file.display())));
    }

    store.save_credential(user, provider, credential.clone()).await?;
    info!(user_id = %user, provider = %provider, "imported credential");
    Ok(credential)
}
