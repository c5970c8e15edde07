//! Google Calendar provider implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use meetsync_core::{CalendarEvent, ProviderKind, UserId};
use tracing::{debug, info};

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::normalize::normalize_events;
use crate::oauth::TokenEndpoint;
use crate::provider::{BoxFuture, CalendarProvider, NewEventData, ProviderClient};

use super::client::GoogleCalendarClient;
use super::config::GoogleConfig;

/// Google Calendar provider.
///
/// Cheap to clone; clones share the configuration and HTTP connection pool.
#[derive(Debug, Clone)]
pub struct GoogleProvider {
    config: Arc<GoogleConfig>,
    http: reqwest::Client,
    token_endpoint: Arc<TokenEndpoint>,
}

impl GoogleProvider {
    /// Creates a provider from validated configuration.
    pub fn new(config: GoogleConfig) -> ProviderResult<Self> {
        config.validate().map_err(|e| {
            ProviderError::configuration(e).with_provider(ProviderKind::Google)
        })?;

        let http = http::build_client(ProviderKind::Google, config.timeout)?;
        let token_endpoint = TokenEndpoint {
            provider: ProviderKind::Google,
            token_url: config.token_url.clone(),
            credentials: config.credentials.clone(),
            // Google keeps the scopes of the original grant
            scopes: Vec::new(),
        };

        Ok(Self {
            config: Arc::new(config),
            http,
            token_endpoint: Arc::new(token_endpoint),
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.config
    }

    /// Refreshes an expired credential against Google's token endpoint.
    pub async fn refresh_credential(
        &self,
        current: &Credential,
        now: DateTime<Utc>,
    ) -> ProviderResult<Credential> {
        self.token_endpoint.refresh(&self.http, current, now).await
    }

    fn api<'a>(&'a self, client: &'a ProviderClient) -> GoogleCalendarClient<'a> {
        GoogleCalendarClient {
            client,
            base_url: &self.config.api_base_url,
            calendar_id: &self.config.calendar_id,
        }
    }
}

impl CalendarProvider for GoogleProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Google
    }

    fn create_client(&self, credential: &Credential) -> ProviderClient {
        ProviderClient::new(
            ProviderKind::Google,
            self.http.clone(),
            &credential.access_token,
        )
    }

    fn fetch_events<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
    ) -> BoxFuture<'a, ProviderResult<Vec<CalendarEvent>>> {
        Box::pin(async move {
            let now = Utc::now();
            let raw = self
                .api(client)
                .list_events(now, now + self.config.fetch_horizon, self.config.page_size)
                .await?;
            debug!(user_id = %user, count = raw.len(), "normalizing google events");
            normalize_events(user, ProviderKind::Google, &raw, self.config.timestamp_policy)
        })
    }

    fn create_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        event: &'a NewEventData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            let id = self.api(client).insert_event(event).await?;
            info!(user_id = %user, event_id = %id, "created google event");
            Ok(id)
        })
    }

    fn delete_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        provider_name: &'a str,
        provider_event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.ensure_routed_here(provider_name, client)?;
            self.api(client).delete_event(provider_event_id).await?;
            info!(user_id = %user, event_id = provider_event_id, "deleted google event");
            Ok(())
        })
    }
}
