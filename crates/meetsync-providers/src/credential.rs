//! Per-user provider credentials and the store that holds them.
//!
//! A [`Credential`] is an opaque bearer token with optional expiry and refresh
//! token. The [`CredentialStore`] contract separates "no credential" (the
//! normal not-linked case, `Ok(None)`) from a store failure (`Err`).

use std::collections::HashMap;
use std::path::PathBuf;

use chrono::{DateTime, Duration, Utc};
use meetsync_core::{ProviderKind, UserId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use crate::provider::BoxFuture;

/// Credentials are treated as expired this long before their real expiry.
pub const EXPIRY_SKEW: Duration = Duration::seconds(60);

/// An OAuth bearer credential for one (user, provider) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    /// When the access token expires. `None` means it does not expire.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: None,
            expires_at: None,
            scopes: Vec::new(),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the expiry from a token endpoint's `expires_in` seconds.
    pub fn with_expires_in(mut self, secs: i64, now: DateTime<Utc>) -> Self {
        self.expires_at = Some(now + Duration::seconds(secs));
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Returns true if the access token is expired, or will be within
    /// [`EXPIRY_SKEW`], at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| now + EXPIRY_SKEW >= expires_at)
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// A failure of the credential store itself.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("credential store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("credential store at {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// Storage of per-(user, provider) credentials.
pub trait CredentialStore: Send + Sync {
    /// Looks up a credential. Absence is `Ok(None)`.
    fn get_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
    ) -> BoxFuture<'_, Result<Option<Credential>, CredentialStoreError>>;

    /// Inserts or replaces a credential.
    fn save_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
        credential: Credential,
    ) -> BoxFuture<'_, Result<(), CredentialStoreError>>;
}

/// An in-memory credential store.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    credentials: RwLock<HashMap<(UserId, ProviderKind), Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder used to seed the store.
    pub fn with_credential(
        mut self,
        user: UserId,
        provider: ProviderKind,
        credential: Credential,
    ) -> Self {
        self.credentials
            .get_mut()
            .insert((user, provider), credential);
        self
    }

    pub async fn len(&self) -> usize {
        self.credentials.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.credentials.read().await.is_empty()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
    ) -> BoxFuture<'_, Result<Option<Credential>, CredentialStoreError>> {
        Box::pin(async move { Ok(self.credentials.read().await.get(&(user, provider)).cloned()) })
    }

    fn save_credential(
        &self,
        user: UserId,
        provider: ProviderKind,
        credential: Credential,
    ) -> BoxFuture<'_, Result<(), CredentialStoreError>> {
        Box::pin(async move {
            self.credentials
                .write()
                .await
                .insert((user, provider), credential);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn expiry_includes_skew() {
        let now = Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap();
        let cred = Credential::new("tok").with_expires_in(3600, now);
        assert!(!cred.is_expired_at(now));
        assert!(cred.is_expired_at(now + Duration::seconds(3550)));
        assert!(!Credential::new("forever").is_expired_at(now));
    }

    #[test]
    fn refresh_requires_non_empty_token() {
        assert!(!Credential::new("a").can_refresh());
        assert!(!Credential::new("a").with_refresh_token("").can_refresh());
        assert!(Credential::new("a").with_refresh_token("r").can_refresh());
    }

    #[test]
    fn deserializes_minimal_json() {
        let cred: Credential = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(cred, Credential::new("abc"));
    }

    #[tokio::test]
    async fn memory_store_distinguishes_absence() {
        let store = MemoryCredentialStore::new().with_credential(
            UserId(1),
            ProviderKind::Google,
            Credential::new("g1"),
        );

        let found = store.get_credential(UserId(1), ProviderKind::Google).await.unwrap();
        assert_eq!(found.map(|c| c.access_token), Some("g1".to_string()));

        let missing = store.get_credential(UserId(1), ProviderKind::Microsoft).await.unwrap();
        assert!(missing.is_none());

        store
            .save_credential(UserId(1), ProviderKind::Microsoft, Credential::new("m1"))
            .await
            .unwrap();
        assert_eq!(store.len().await, 2);
    }
}
