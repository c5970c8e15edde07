#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use meetsync_core::{EventDetails, NewAppointmentRequest, ProviderKind, RequestTarget, UserId};
use meetsync_providers::{
    Credential, GoogleConfig, MemoryCredentialStore, MicrosoftConfig, OAuthCredentials,
    ProviderRegistry, ProvidersConfig,
};
use meetsync_service::{MemoryStore, Orchestrator, OrchestratorConfig, Stores};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const GOOGLE_EVENTS: &str = "/google/calendars/primary/events";
pub const GRAPH_EVENTS: &str = "/graph/me/events";

/// The bearer token seeded for `user` on `provider`.
pub fn token(user: i64, provider: ProviderKind) -> String {
    match provider {
        ProviderKind::Google => format!("g{user}"),
        ProviderKind::Microsoft => format!("m{user}"),
    }
}

pub fn bearer(user: i64, provider: ProviderKind) -> String {
    format!("Bearer {}", token(user, provider))
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn sync_details() -> EventDetails {
    EventDetails::new("Sync", utc(2023, 6, 2, 10, 0), utc(2023, 6, 2, 12, 0))
}

pub fn request(requester: i64, target: i64) -> NewAppointmentRequest {
    NewAppointmentRequest::new(UserId(requester), RequestTarget::User(UserId(target)), sync_details())
}

/// Both providers pointed at one mock server, with credentials for the given
/// (user, provider) links.
pub struct Harness {
    pub server: MockServer,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<ProviderRegistry>,
}

impl Harness {
    pub async fn new(links: &[(i64, ProviderKind)]) -> Self {
        Self::with_store(links, MemoryStore::new()).await
    }

    pub async fn with_store(links: &[(i64, ProviderKind)], store: MemoryStore) -> Self {
        let server = MockServer::start().await;
        let mut credentials = MemoryCredentialStore::new();
        for &(user, provider) in links {
            credentials = credentials.with_credential(
                UserId(user),
                provider,
                Credential::new(token(user, provider)),
            );
        }

        let config = ProvidersConfig::default()
            .with_google(
                GoogleConfig::new(OAuthCredentials::new("g-client", "g-secret"))
                    .with_api_base_url(format!("{}/google", server.uri()))
                    .with_token_url(format!("{}/google/token", server.uri())),
            )
            .with_microsoft(
                MicrosoftConfig::new(OAuthCredentials::new("m-client", "m-secret"))
                    .with_api_base_url(format!("{}/graph", server.uri()))
                    .with_token_url(format!("{}/ms/token", server.uri())),
            );
        let registry = ProviderRegistry::new(config, Arc::new(credentials)).unwrap();

        Self {
            server,
            store: Arc::new(store),
            registry: Arc::new(registry),
        }
    }

    pub fn stores(&self) -> Stores {
        Stores::memory(self.store.clone())
    }

    pub fn orchestrator(&self) -> Orchestrator {
        Orchestrator::new(self.registry.clone(), self.stores(), OrchestratorConfig::default())
    }

    /// Remote create for `user` on `provider` answers with `event_id`.
    pub async fn create_succeeds(&self, user: i64, provider: ProviderKind, event_id: &str) {
        let (path_str, status) = match provider {
            ProviderKind::Google => (GOOGLE_EVENTS, 200),
            ProviderKind::Microsoft => (GRAPH_EVENTS, 201),
        };
        Mock::given(method("POST"))
            .and(path(path_str))
            .and(header("Authorization", bearer(user, provider).as_str()))
            .respond_with(
                ResponseTemplate::new(status).set_body_json(serde_json::json!({ "id": event_id })),
            )
            .mount(&self.server)
            .await;
    }

    /// The next `times` remote creates for `user` on `provider` fail with
    /// `status`.
    pub async fn create_fails(&self, user: i64, provider: ProviderKind, status: u16, times: u64) {
        let path_str = match provider {
            ProviderKind::Google => GOOGLE_EVENTS,
            ProviderKind::Microsoft => GRAPH_EVENTS,
        };
        Mock::given(method("POST"))
            .and(path(path_str))
            .and(header("Authorization", bearer(user, provider).as_str()))
            .respond_with(ResponseTemplate::new(status).set_body_string("upstream failure"))
            .up_to_n_times(times)
            .with_priority(1)
            .mount(&self.server)
            .await;
    }

    /// Remote delete of `event_id` on `provider` answers `status`,
    /// expected exactly `expected` times.
    pub async fn delete_answers(&self, provider: ProviderKind, event_id: &str, status: u16, expected: u64) {
        let url = match provider {
            ProviderKind::Google => format!("{GOOGLE_EVENTS}/{event_id}"),
            ProviderKind::Microsoft => format!("{GRAPH_EVENTS}/{event_id}"),
        };
        Mock::given(method("DELETE"))
            .and(path(url.as_str()))
            .respond_with(ResponseTemplate::new(status))
            .expect(expected)
            .mount(&self.server)
            .await;
    }
}
