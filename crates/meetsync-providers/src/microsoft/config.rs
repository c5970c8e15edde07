//! Microsoft Graph provider configuration.

use std::time::Duration;

use crate::normalize::TimestampPolicy;
use crate::oauth::OAuthCredentials;

/// Configuration for the Microsoft (Outlook / Graph) provider.
#[derive(Debug, Clone)]
pub struct MicrosoftConfig {
    /// Azure AD application registration.
    pub credentials: OAuthCredentials,
    pub token_url: String,
    /// Graph base URL, without a trailing slash.
    pub api_base_url: String,
    /// Scopes sent with refresh grants. Graph requires them on every grant.
    pub scopes: Vec<String>,
    pub timeout: Duration,
    pub fetch_horizon: chrono::Duration,
    /// `$top` for calendar view pages.
    pub page_size: u32,
    pub timestamp_policy: TimestampPolicy,
}

impl MicrosoftConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://graph.microsoft.com/v1.0";
    pub const DEFAULT_TOKEN_URL: &'static str =
        "https://login.microsoftonline.com/common/oauth2/v2.0/token";
    pub const DEFAULT_SCOPES: [&'static str; 2] = ["Calendars.ReadWrite", "offline_access"];
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_HORIZON_DAYS: i64 = 365;
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            api_base_url: Self::DEFAULT_API_BASE.to_string(),
            scopes: Self::DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            fetch_horizon: chrono::Duration::days(Self::DEFAULT_HORIZON_DAYS),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timestamp_policy: TimestampPolicy::default(),
        }
    }

    /// Uses a single-tenant token endpoint instead of `common`.
    pub fn with_tenant(mut self, tenant: &str) -> Self {
        self.token_url = format!(
            "https://login.microsoftonline.com/{}/oauth2/v2.0/token",
            urlencoding::encode(tenant)
        );
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fetch_horizon(mut self, horizon: chrono::Duration) -> Self {
        self.fetch_horizon = horizon;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timestamp_policy(mut self, policy: TimestampPolicy) -> Self {
        self.timestamp_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.credentials.validate().map_err(str::to_string)?;
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".into());
        }
        if self.page_size == 0 || self.page_size > 1000 {
            return Err("page_size must be between 1 and 1000".into());
        }
        if self.fetch_horizon <= chrono::Duration::zero() {
            return Err("fetch_horizon must be positive".into());
        }
        if self.scopes.is_empty() {
            return Err("at least one scope is required".into());
        }
        for (name, value) in [("api_base_url", &self.api_base_url), ("token_url", &self.token_url)] {
            url::Url::parse(value).map_err(|e| format!("invalid {name} '{value}': {e}"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MicrosoftConfig {
        MicrosoftConfig::new(OAuthCredentials::new("app-id", "secret"))
    }

    #[test]
    fn defaults_request_offline_access() {
        let config = config();
        assert!(config.scopes.iter().any(|s| s == "offline_access"));
        assert!(config.token_url.contains("/common/"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tenant_changes_token_url() {
        let config = config().with_tenant("contoso.onmicrosoft.com");
        assert_eq!(
            config.token_url,
            "https://login.microsoftonline.com/contoso.onmicrosoft.com/oauth2/v2.0/token"
        );
    }

    #[test]
    fn rejects_empty_scopes_and_bad_urls() {
        assert!(config().with_scopes(vec![]).validate().is_err());
        assert!(config().with_token_url("::").validate().is_err());
        assert!(config().with_page_size(5000).validate().is_err());
    }
}
