//! Microsoft Graph provider implementation.

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

use super::client::GraphCalendarClient;
use super::config::MicrosoftConfig;

#[derive(Debug, Clone)]
pub struct MicrosoftProvider {
    config: Arc<MicrosoftConfig>,
    http: reqwest::Client,
    token_endpoint: Arc<TokenEndpoint>,
}

impl MicrosoftProvider {
    pub fn new(config: MicrosoftConfig) -> ProviderResult<Self> {
        config.validate().map_err(|e| {
            ProviderError::configuration(e).with_provider(ProviderKind::Microsoft)
        })?;
        let http = http::build_client(ProviderKind::Microsoft, config.timeout)?;
        let token_endpoint = Arc::new(TokenEndpoint {
            provider: ProviderKind::Microsoft,
            token_url: config.token_url.clone(),
            credentials: config.credentials.clone(),
            scopes: config.scopes.clone(),
        });
        Ok(Self {
            config: Arc::new(config),
            http,
            token_endpoint,
        })
    }

    pub fn config(&self) -> &MicrosoftConfig {
        &self.config
    }

    pub async fn refresh_credential(
        &self,
        current: &Credential,
        now: DateTime<Utc>,
    ) -> ProviderResult<Credential> {
        self.token_endpoint.refresh(&self.http, current, now).await
    }

    fn graph<'a>(&'a self, client: &'a ProviderClient) -> GraphCalendarClient<'a> {
        GraphCalendarClient {
            client,
            base_url: &self.config.api_base_url,
        }
    }
}

impl CalendarProvider for MicrosoftProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Microsoft
    }

    fn create_client(&self, credential: &Credential) -> ProviderClient {
        ProviderClient::new(
            ProviderKind::Microsoft,
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
                .graph(client)
                .calendar_view(now, now + self.config.fetch_horizon, self.config.page_size)
                .await?;
            debug!(user_id = %user, count = raw.len(), "normalizing microsoft events");
            normalize_events(
                user,
                ProviderKind::Microsoft,
                &raw,
                self.config.timestamp_policy,
            )
        })
    }

    fn create_event<'a>(
        &'a self,
        user: UserId,
        client: &'a ProviderClient,
        event: &'a NewEventData,
    ) -> BoxFuture<'a, ProviderResult<String>> {
        Box::pin(async move {
            let id = self.graph(client).create_event(event).await?;
            info!(user_id = %user, event_id = %id, "created microsoft event");
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
            self.graph(client).delete_event(provider_event_id).await?;
            info!(user_id = %user, event_id = provider_event_id, "deleted microsoft event");
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use crate::oauth::OAuthCredentials;
    use chrono::TimeZone;
    use meetsync_core::EventDetails;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> MicrosoftProvider {
        let config = MicrosoftConfig::new(OAuthCredentials::new("app", "secret"))
            .with_api_base_url(server.uri())
            .with_token_url(format!("{}/token", server.uri()));
        MicrosoftProvider::new(config).unwrap()
    }

    fn client(provider: &MicrosoftProvider) -> ProviderClient {
        provider.create_client(&Credential::new("ms-token"))
    }

    fn graph_event(id: &str, start: &str, end: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "subject": id,
            "start": { "dateTime": start, "timeZone": "UTC" },
            "end": { "dateTime": end, "timeZone": "UTC" },
            "isAllDay": false
        })
    }

    #[tokio::test]
    async fn calendar_view_follows_next_link() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarview"))
            .and(query_param("$skip", "1"))
            .and(header("Prefer", r#"outlook.timezone="UTC""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [graph_event("b", "2023-06-03T09:00:00.0000000", "2023-06-03T10:00:00.0000000")]
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me/calendarview"))
            .and(header("Authorization", "Bearer ms-token"))
            .and(header("Prefer", r#"outlook.timezone="UTC""#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [graph_event("a", "2023-06-02T10:00:00.0000000", "2023-06-02T11:30:00.0000000")],
                "@odata.nextLink": format!("{}/me/calendarview?$skip=1", server.uri())
            })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let events = provider.fetch_events(UserId(2), &client(&provider)).await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].provider, ProviderKind::Microsoft);
        assert_eq!(events[0].start, Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap());
        assert_eq!(events[0].end, Utc.with_ymd_and_hms(2023, 6, 2, 11, 30, 0).unwrap());
        assert_eq!(events[1].provider_event_id, "b");
    }

    #[tokio::test]
    async fn endless_next_links_are_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarview"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [],
                "@odata.nextLink": format!("{}/me/calendarview?$skip=0", server.uri())
            })))
            .expect(crate::http::MAX_PAGES as u64)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let err = provider.fetch_events(UserId(2), &client(&provider)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
        assert_eq!(err.provider(), Some(ProviderKind::Microsoft));
    }

    #[tokio::test]
    async fn create_posts_to_me_events() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/events"))
            .and(body_partial_json(serde_json::json!({
                "subject": "Sync",
                "start": { "dateTime": "2023-06-02T10:00:00.0000000", "timeZone": "UTC" }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "id": "ev_c" })))
            .expect(1)
            .mount(&server)
            .await;

        let provider = provider(&server);
        let details = EventDetails::new(
            "Sync",
            Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 2, 12, 0, 0).unwrap(),
        );
        let id = provider
            .create_event(UserId(2), &client(&provider), &details)
            .await
            .unwrap();
        assert_eq!(id, "ev_c");
    }

    #[tokio::test]
    async fn create_without_id_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/me/events"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let details = EventDetails::new("x", Utc::now(), Utc::now() + chrono::Duration::hours(1));
        let err = provider
            .create_event(UserId(2), &client(&provider), &details)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::InvalidResponse);
    }

    #[tokio::test]
    async fn delete_and_throttling() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/me/events/ev_c"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/me/events/busy"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let client = client(&provider);
        provider
            .delete_event(UserId(2), &client, "microsoft", "ev_c")
            .await
            .unwrap();

        let err = provider
            .delete_event(UserId(2), &client, "microsoft", "busy")
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert!(err.is_transient());
        assert!(err.message().contains("retry after 7s"));
    }

    #[tokio::test]
    async fn server_error_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/me/calendarview"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let provider = provider(&server);
        let err = provider.fetch_events(UserId(2), &client(&provider)).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::ServerError);
        assert!(err.is_transient());
    }
}
