//! CalendarProvider trait definition.
//!
//! A provider wraps one external calendar API behind a uniform contract:
//! bind a credential to a transport, list events, create one event, delete
//! one event. The supported providers form a closed set, see [`Provider`].

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use meetsync_core::{CalendarEvent, EventDetails, ProviderKind, UserId};
use reqwest::{Method, RequestBuilder};

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::google::GoogleProvider;
use crate::microsoft::MicrosoftProvider;

/// A boxed future for async trait methods.
///
/// Keeps the traits object-safe so stores and providers can sit behind
/// `Arc<dyn ...>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The event data sent to a provider when creating an event.
pub type NewEventData = EventDetails;

/// An authenticated transport handle for one user on one provider.
///
/// Building one performs no network I/O. The inner `reqwest::Client` is
/// shared with the provider that created it and carries its per-call timeout.
#[derive(Clone)]
pub struct ProviderClient {
    provider: ProviderKind,
    http: reqwest::Client,
    access_token: String,
}

impl ProviderClient {
    pub fn new(
        provider: ProviderKind,
        http: reqwest::Client,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            http,
            access_token: access_token.into(),
        }
    }

    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Starts a request carrying the bearer credential.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(&self.access_token)
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("provider", &self.provider)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// The contract every calendar provider implements.
pub trait CalendarProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Stable provider tag, as stored in appointment-event rows.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Binds a credential to this provider's transport.
    fn create_client(&self, credential: &Credential) -> ProviderClient;

    /// Lists the user's events for the provider's forward-looking window.
    ///
    /// Zero events is a valid result.
    fn fetch_events<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>>;

    /// Creates exactly one remote event and returns its provider id.
    ///
    /// Not idempotent: calling it twice creates two events.
    fn create_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        event: &'a NewEventData,
    ) -> BoxFuture<'a, ProviderResult<String>>;

    /// Deletes one remote event.
    ///
    /// `provider_name` must equal [`CalendarProvider::name`]; anything else
    /// fails with a provider-mismatch error before any request is made.
    fn delete_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        provider_name: &'a str,
        provider_event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;

    /// Checks that a call addressed to `provider_name` and carrying `client`
    /// belongs to this provider.
    fn ensure_routed_here(
        &self,
        provider_name: &str,
        client: &ProviderClient,
    ) -> ProviderResult<()> {
        if provider_name != self.name() {
            return Err(ProviderError::provider_mismatch(self.kind(), provider_name));
        }
        if client.provider() != self.kind() {
            return Err(ProviderError::provider_mismatch(
                self.kind(),
                client.provider().as_str(),
            ));
        }
        Ok(())
    }
}

/// The closed set of supported providers.
#[derive(Debug, Clone)]
pub enum Provider {
    Google(GoogleProvider),
    Microsoft(MicrosoftProvider),
}

impl Provider {
    fn inner(&self) -> &dyn CalendarProvider {
        match self {
            Self::Google(p) => p,
            Self::Microsoft(p) => p,
        }
    }

    /// Exchanges the refresh token in `current` at this provider's token
    /// endpoint.
    pub async fn refresh_credential(
        &self,
        current: &Credential,
        now: DateTime<Utc>,
    ) -> ProviderResult<Credential> {
        match self {
            Self::Google(p) => p.refresh_credential(current, now).await,
            Self::Microsoft(p) => p.refresh_credential(current, now).await,
        }
    }
}

impl From<GoogleProvider> for Provider {
    fn from(provider: GoogleProvider) -> Self {
        Self::Google(provider)
    }
}

impl From<MicrosoftProvider> for Provider {
    fn from(provider: MicrosoftProvider) -> Self {
        Self::Microsoft(provider)
    }
}

impl CalendarProvider for Provider {
    fn kind(&self) -> ProviderKind {
        self.inner().kind()
    }

    fn create_client(&self, credential: &Credential) -> ProviderClient {
        self.inner().create_client(credential)
    }

    fn fetch_events<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        self.inner().fetch_events(user, client)
    }

    fn create_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        event: &'a NewEventData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        self.inner().create_event(user, client, event)
    }

    fn delete_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        provider_name: &'a str,
        provider_event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        self.inner()
            .delete_event(user, client, provider_name, provider_event_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::google::GoogleConfig;
    use crate::microsoft::MicrosoftConfig;
    use crate::oauth::OAuthCredentials;

    fn google() -> Provider {
        GoogleProvider::new(GoogleConfig::new(OAuthCredentials::new("id", "secret")))
            .unwrap()
            .into()
    }

    fn microsoft() -> Provider {
        MicrosoftProvider::new(MicrosoftConfig::new(OAuthCredentials::new("id", "secret")))
            .unwrap()
            .into()
    }

    #[test]
    fn names_are_stable_tags() {
        assert_eq!(google().name(), "google");
        assert_eq!(microsoft().name(), "microsoft");
    }

    #[test]
    fn client_debug_redacts_token() {
        let client = google().create_client(&Credential::new("super-secret"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("super-secret"));
        assert_eq!(client.provider(), ProviderKind::Google);
    }

    #[tokio::test]
    async fn delete_with_wrong_name_is_rejected_without_io() {
        let provider = google();
        let client = provider.create_client(&Credential::new("t"));
        let err = provider
            .delete_event(UserId(1), &client, "microsoft", "ev1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ProviderMismatch);
    }

    #[tokio::test]
    async fn delete_with_foreign_client_is_rejected() {
        let provider = microsoft();
        let client = google().create_client(&Credential::new("t"));
        let err = provider
            .delete_event(UserId(1), &client, "microsoft", "ev1")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ProviderMismatch);
    }
}
