//! Google Calendar provider configuration.

use std::time::Duration;

use crate::normalize::TimestampPolicy;
use crate::oauth::OAuthCredentials;

/// Configuration for the Google Calendar provider.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client registered in the Google Cloud console.
    pub credentials: OAuthCredentials,

    /// Token endpoint used for refresh grants.
    pub token_url: String,

    /// Calendar API v3 base URL, without a trailing slash.
    pub api_base_url: String,

    /// Calendar to read from and write to. Defaults to `"primary"`.
    pub calendar_id: String,

    /// Scopes requested when linking an account.
    pub scopes: Vec<String>,

    /// Deadline for every HTTP call.
    pub timeout: Duration,

    /// How far ahead of now events are fetched.
    pub fetch_horizon: chrono::Duration,

    /// `maxResults` per page; pagination continues until exhausted.
    pub page_size: u32,

    pub timestamp_policy: TimestampPolicy,
}

impl GoogleConfig {
    pub const DEFAULT_API_BASE: &'static str = "https://www.googleapis.com/calendar/v3";
    pub const DEFAULT_TOKEN_URL: &'static str = "https://oauth2.googleapis.com/token";
    pub const DEFAULT_SCOPE: &'static str = "https://www.googleapis.com/auth/calendar";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_HORIZON_DAYS: i64 = 365;
    pub const DEFAULT_PAGE_SIZE: u32 = 250;

    pub fn new(credentials: OAuthCredentials) -> Self {
        Self {
            credentials,
            token_url: Self::DEFAULT_TOKEN_URL.to_string(),
            api_base_url: Self::DEFAULT_API_BASE.to_string(),
            calendar_id: "primary".to_string(),
            scopes: vec![Self::DEFAULT_SCOPE.to_string()],
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            fetch_horizon: chrono::Duration::days(Self::DEFAULT_HORIZON_DAYS),
            page_size: Self::DEFAULT_PAGE_SIZE,
            timestamp_policy: TimestampPolicy::default(),
        }
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
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

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.credentials.validate().map_err(str::to_string)?;
        if self.calendar_id.trim().is_empty() {
            return Err("calendar_id must not be empty".into());
        }
        if self.timeout.is_zero() {
            return Err("timeout must be greater than zero".into());
        }
        if self.page_size == 0 || self.page_size > 2500 {
            return Err("page_size must be between 1 and 2500".into());
        }
        if self.fetch_horizon <= chrono::Duration::zero() {
            return Err("fetch_horizon must be positive".into());
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| format!("invalid api_base_url '{}': {e}", self.api_base_url))?;
        url::Url::parse(&self.token_url)
            .map_err(|e| format!("invalid token_url '{}': {e}", self.token_url))?;
        Ok(())
    }
}
