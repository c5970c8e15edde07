//! OAuth 2.0 refresh-token grant.
//!
//! The authorization-code exchange happens elsewhere; this module only turns
//! a stored refresh token into a fresh [`Credential`].

use chrono::{DateTime, Utc};
use meetsync_core::ProviderKind;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credential::Credential;
use crate::error::{ProviderError, ProviderErrorCode, ProviderResult};
use crate::http;

/// OAuth client credentials registered with a provider.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.trim().is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.trim().is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// A provider's token endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    pub provider: ProviderKind,
    pub token_url: String,
    pub credentials: OAuthCredentials,
    /// Scopes sent with the refresh request; empty means none are sent.
    pub scopes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    scope: Option<String>,
}

impl TokenEndpoint {
    /// Exchanges the refresh token in `current` for a new credential.
    ///
    /// The returned credential keeps the old refresh token unless the
    /// provider rotated it.
    pub async fn refresh(
        &self,
        http_client: &reqwest::Client,
        current: &Credential,
        now: DateTime<Utc>,
    ) -> ProviderResult<Credential> {
        let refresh_token = current
            .refresh_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ProviderError::authentication("credential expired and has no refresh token")
                    .with_provider(self.provider)
            })?;

        let scope = self.scopes.join(" ");
        let mut params = vec![
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];
        if !scope.is_empty() {
            params.push(("scope", scope.as_str()));
        }

        debug!(provider = %self.provider, "refreshing access token");
        let request = http_client.post(&self.token_url).form(&params);
        let response = http::send(self.provider, request).await.map_err(|e| {
            // A rejected refresh grant means the user must re-link.
            if matches!(
                e.code(),
                ProviderErrorCode::BadRequest | ProviderErrorCode::AuthorizationFailed
            ) {
                ProviderError::authentication(format!("token refresh rejected: {}", e.message()))
                    .with_provider(self.provider)
            } else {
                e
            }
        })?;
        let token: TokenResponse = http::read_json(self.provider, response).await?;

        let mut refreshed = Credential::new(token.access_token);
        refreshed.refresh_token = token
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| current.refresh_token.clone());
        refreshed.token_type = token.token_type.or_else(|| current.token_type.clone());
        refreshed.expires_at = token.expires_in.map(|secs| now + chrono::Duration::seconds(secs));
        refreshed.scopes = match token.scope {
            Some(scope) => scope.split_whitespace().map(str::to_owned).collect(),
            None => current.scopes.clone(),
        };

        info!(provider = %self.provider, "refreshed access token");
        Ok(refreshed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint(server: &MockServer, scopes: Vec<String>) -> TokenEndpoint {
        TokenEndpoint {
            provider: ProviderKind::Microsoft,
            token_url: format!("{}/token", server.uri()),
            credentials: OAuthCredentials::new("client", "secret"),
            scopes,
        }
    }

    #[tokio::test]
    async fn refresh_keeps_refresh_token_when_not_rotated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=r1"))
            .and(body_string_contains("scope=Calendars.ReadWrite+offline_access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "a2",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let now = Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap();
        let current = Credential::new("a1").with_refresh_token("r1");
        let scopes = vec!["Calendars.ReadWrite".to_string(), "offline_access".to_string()];
        let refreshed = endpoint(&server, scopes)
            .refresh(&reqwest::Client::new(), &current, now)
            .await
            .unwrap();

        assert_eq!(refreshed.access_token, "a2");
        assert_eq!(refreshed.refresh_token.as_deref(), Some("r1"));
        assert_eq!(refreshed.expires_at, Some(now + chrono::Duration::hours(1)));
    }

    #[tokio::test]
    async fn rejected_grant_is_an_authentication_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
            .mount(&server)
            .await;

        let current = Credential::new("a1").with_refresh_token("revoked");
        let err = endpoint(&server, vec![])
            .refresh(&reqwest::Client::new(), &current, Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn missing_refresh_token_fails_without_request() {
        let server = MockServer::start().await;
        let err = endpoint(&server, vec![])
            .refresh(&reqwest::Client::new(), &Credential::new("a1"), Utc::now())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::AuthenticationFailed);
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }
}
