//! Provider Registry: which providers a user has linked, and ready-to-use
//! clients for them.
//!
//! Provider configuration is passed in at construction. A provider with no
//! configuration is unknown to the registry and never reported as linked.

use std::sync::Arc;

use chrono::Utc;
use meetsync_core::{ProviderKind, UnknownProvider, UserId};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credential::{CredentialStore, CredentialStoreError};
use crate::error::{ProviderError, ProviderResult};
use crate::google::{GoogleConfig, GoogleProvider};
use crate::microsoft::{MicrosoftConfig, MicrosoftProvider};
use crate::provider::{CalendarProvider, Provider, ProviderClient};

/// Per-variant provider configuration. `None` disables a variant.
#[derive(Debug, Clone, Default)]
pub struct ProvidersConfig {
    pub google: Option<GoogleConfig>,
    pub microsoft: Option<MicrosoftConfig>,
}

impl ProvidersConfig {
    pub fn with_google(mut self, config: GoogleConfig) -> Self {
        self.google = Some(config);
        self
    }

    pub fn with_microsoft(mut self, config: MicrosoftConfig) -> Self {
        self.microsoft = Some(config);
        self
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("credential lookup failed for user {user} on {provider}: {source}")]
    CredentialStore {
        user: UserId,
        provider: ProviderKind,
        #[source]
        source: CredentialStoreError,
    },

    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    #[error("provider {0} is not configured")]
    NotConfigured(ProviderKind),

    #[error("user {user} has not linked {provider}")]
    NotLinked { user: UserId, provider: ProviderKind },

    #[error("credential refresh failed for user {user} on {provider}: {source}")]
    Refresh {
        user: UserId,
        provider: ProviderKind,
        #[source]
        source: ProviderError,
    },
}

/// Resolves linked providers and authenticated clients for users.
#[derive(Clone)]
pub struct ProviderRegistry {
    google: Option<GoogleProvider>,
    microsoft: Option<MicrosoftProvider>,
    credentials: Arc<dyn CredentialStore>,
}

impl ProviderRegistry {
    /// Builds every configured provider.
    ///
    /// # Errors
    ///
    /// Fails if any present configuration is invalid.
    pub fn new(
        config: ProvidersConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> ProviderResult<Self> {
        let google = config.google.map(GoogleProvider::new).transpose()?;
        let microsoft = config.microsoft.map(MicrosoftProvider::new).transpose()?;
        let registry = Self {
            google,
            microsoft,
            credentials,
        };
        info!(providers = ?registry.configured_kinds(), "provider registry ready");
        Ok(registry)
    }

    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// The configured provider for `kind`, if any.
    pub fn provider(&self, kind: ProviderKind) -> Option<Provider> {
        match kind {
            ProviderKind::Google => self.google.clone().map(Provider::from),
            ProviderKind::Microsoft => self.microsoft.clone().map(Provider::from),
        }
    }

    /// Configured variants, in [`ProviderKind::ALL`] order.
    pub fn configured_kinds(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.provider(*kind).is_some())
            .collect()
    }

    /// Providers for which `user` has a stored credential.
    ///
    /// No credential at all is an empty list. A store failure on any variant
    /// aborts the whole call.
    pub async fn linked_providers(&self, user: UserId) -> Result<Vec<Provider>, RegistryError> {
        let mut linked = Vec::new();
        for kind in ProviderKind::ALL {
            let Some(provider) = self.provider(kind) else {
                continue;
            };
            let credential = self
                .credentials
                .get_credential(user, kind)
                .await
                .map_err(|source| RegistryError::CredentialStore {
                    user,
                    provider: kind,
                    source,
                })?;
            if credential.is_some() {
                linked.push(provider);
            }
        }
        debug!(user_id = %user, count = linked.len(), "resolved linked providers");
        Ok(linked)
    }

    pub async fn linked_kinds(&self, user: UserId) -> Result<Vec<ProviderKind>, RegistryError> {
        Ok(self
            .linked_providers(user)
            .await?
            .iter()
            .map(|p| p.kind())
            .collect())
    }

    /// Looks up a provider by its stored tag, without checking whether
    /// `user` has linked it.
    pub fn provider_by_name(&self, user: UserId, name: &str) -> Result<Provider, RegistryError> {
        let kind: ProviderKind = name.parse()?;
        debug!(user_id = %user, provider = %kind, "provider by name");
        self.provider(kind).ok_or(RegistryError::NotConfigured(kind))
    }

    /// Builds an authenticated client for `user` on `provider`.
    ///
    /// An expired credential is refreshed and saved back to the store first.
    pub async fn client_for(
        &self,
        user: UserId,
        provider: &Provider,
    ) -> Result<ProviderClient, RegistryError> {
        let kind = provider.kind();
        let credential = self
            .credentials
            .get_credential(user, kind)
            .await
            .map_err(|source| RegistryError::CredentialStore {
                user,
                provider: kind,
                source,
            })?
            .ok_or(RegistryError::NotLinked {
                user,
                provider: kind,
            })?;

        let now = Utc::now();
        if !credential.is_expired_at(now) {
            return Ok(provider.create_client(&credential));
        }

        debug!(user_id = %user, provider = %kind, "credential expired, refreshing");
        let refreshed = provider
            .refresh_credential(&credential, now)
            .await
            .map_err(|source| RegistryError::Refresh {
                user,
                provider: kind,
                source,
            })?;

        if let Err(e) = self
            .credentials
            .save_credential(user, kind, refreshed.clone())
            .await
        {
            // The refreshed token is still usable for this call
            warn!(user_id = %user, provider = %kind, error = %e, "failed to persist refreshed credential");
        }

        Ok(provider.create_client(&refreshed))
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("configured", &self.configured_kinds())
            .finish_non_exhaustive()
    }
}
