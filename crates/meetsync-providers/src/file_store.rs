//! File-backed credential store.
//!
//! All credentials live in a single JSON document keyed by user id and then
//! provider tag:
//!
//! ```json
//! { "1": { "google": { "access_token": "...", "refresh_token": "..." } } }
//! ```
//!
//! Writes go to a temporary file that is renamed over the original, and the
//! file is restricted to the owner on Unix.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use meetsync_core::{ProviderKind, UserId};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::credential::{Credential, CredentialStore, CredentialStoreError};
use crate::provider::BoxFuture;

type Document = BTreeMap<UserId, BTreeMap<ProviderKind, Credential>>;

/// A credential store persisted as a JSON file.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles.
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists the providers a user has credentials for.
    pub async fn providers_for(
        &self,
        user: UserId,
    ) -> Result<Vec<ProviderKind>, CredentialStoreError> {
        let doc = self.load().await?;
        Ok(doc
            .get(&user)
            .map(|entries| entries.keys().copied().collect())
            .unwrap_or_default())
    }

    /// Removes a credential. Returns whether one was present.
    pub async fn remove_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
    ) -> Result<bool, CredentialStoreError> {
        let _guard = self.write_lock.lock().await;
        let mut doc = self.load().await?;
        let removed = doc
            .get_mut(&user)
            .and_then(|entries| entries.remove(&provider))
            .is_some();
        if removed {
            doc.retain(|_, entries| !entries.is_empty());
            self.persist(&doc).await?;
        }
        Ok(removed)
    }

    async fn load(&self) -> Result<Document, CredentialStoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no credential file yet");
                return Ok(Document::new());
            }
            Err(source) => return Err(self.io_error(source)),
        };
        if content.trim().is_empty() {
            return Ok(Document::new());
        }
        serde_json::from_str(&content).map_err(|source| CredentialStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    async fn persist(&self, doc: &Document) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| self.io_error(source))?;
        }

        let content = serde_json::to_string_pretty(doc).map_err(|source| {
            CredentialStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content)
            .await
            .map_err(|source| self.io_error(source))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|source| self.io_error(source))?;
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|source| self.io_error(source))?;

        debug!(path = %self.path.display(), "saved credentials");
        Ok(())
    }

    fn io_error(&self, source: std::io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl CredentialStore for FileCredentialStore {
    fn get_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
    ) -> BoxFuture<'_, Result<Option<Credential>, CredentialStoreError>> {
        Box::pin(async move {
            let mut doc = self.load().await?;
            Ok(doc
                .get_mut(&user)
                .and_then(|entries| entries.remove(&provider)))
        })
    }

    fn save_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
        credential: Credential,
    ) -> BoxFuture<'_, Result<(), CredentialStoreError>> {
        Box::pin(async move {
            let _guard = self.write_lock.lock().await;
            let mut doc = self.load().await?;
            doc.entry(user).or_default().insert(provider, credential);
            self.persist(&doc).await
        })
    }
}
