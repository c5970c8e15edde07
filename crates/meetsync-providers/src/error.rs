//! Error types for calendar provider operations.

use std::fmt;

use meetsync_core::ProviderKind;
use thiserror::Error;

/// The category of a provider error.
///
/// Codes group into transient failures (worth retrying with backoff),
/// rejections of a well-formed request, and local failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Credentials are invalid or expired (401).
    AuthenticationFailed,
    /// The user lacks permission (403).
    AuthorizationFailed,
    /// Connection failed, DNS resolution, broken body, etc.
    NetworkError,
    /// The per-call deadline elapsed.
    Timeout,
    /// Too many requests (429).
    RateLimited,
    /// The provider returned a 5xx status.
    ServerError,
    /// The response could not be parsed or lacked required data.
    InvalidResponse,
    /// The remote resource does not exist (404).
    NotFound,
    /// The provider rejected the request with another 4xx status.
    BadRequest,
    /// Missing or invalid provider configuration.
    ConfigurationError,
    /// An operation was routed to the wrong provider variant.
    ProviderMismatch,
    /// Unexpected local state.
    InternalError,
}

impl ProviderErrorCode {
    /// Returns true if the failure is transient and the call may be retried.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::Timeout | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns true if the provider refused a well-formed request.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::BadRequest)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::Timeout => "timeout",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
            Self::ProviderMismatch => "provider_mismatch",
            Self::InternalError => "internal_error",
        }
    }

    /// Maps an HTTP status to the matching code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::AuthenticationFailed,
            403 => Self::AuthorizationFailed,
            404 | 410 => Self::NotFound,
            408 => Self::Timeout,
            429 => Self::RateLimited,
            400..=499 => Self::BadRequest,
            500..=599 => Self::ServerError,
            _ => Self::InvalidResponse,
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error that occurred while interacting with a calendar provider.
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    provider: Option<ProviderKind>,
    /// HTTP status returned by the provider, if the failure came from one.
    status: Option<u16>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            status: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Timeout, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Creates the error raised when a call names a provider other than the
    /// one it was routed to.
    pub fn provider_mismatch(expected: ProviderKind, got: &str) -> Self {
        Self::new(
            ProviderErrorCode::ProviderMismatch,
            format!("operation for provider '{got}' routed to {expected}"),
        )
        .with_provider(expected)
    }

    /// Creates an error from a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("API error ({status})")
        } else {
            format!("API error ({status}): {body}")
        };
        let mut err = Self::new(ProviderErrorCode::from_status(status), message);
        err.status = Some(status);
        err
    }

    /// Creates an error from a transport failure.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let base = if err.is_timeout() {
            Self::timeout("request timed out")
        } else if err.is_connect() {
            Self::network(format!("connection failed: {err}"))
        } else if err.is_decode() || err.is_body() {
            Self::network(format!("failed to read response: {err}"))
        } else {
            Self::network(format!("request failed: {err}"))
        };
        base.with_source(err)
    }

    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn provider(&self) -> Option<ProviderKind> {
        self.provider
    }

    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn is_transient(&self) -> bool {
        self.code.is_transient()
    }

    pub fn is_rejected(&self) -> bool {
        self.code.is_rejected()
    }

    pub fn is_not_found(&self) -> bool {
        self.code == ProviderErrorCode::NotFound
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(provider) = self.provider {
            write!(f, "[{provider}] ")?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for provider operations.
pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_codes() {
        assert!(ProviderErrorCode::NetworkError.is_transient());
        assert!(ProviderErrorCode::Timeout.is_transient());
        assert!(ProviderErrorCode::RateLimited.is_transient());
        assert!(ProviderErrorCode::ServerError.is_transient());
        assert!(!ProviderErrorCode::AuthenticationFailed.is_transient());
        assert!(!ProviderErrorCode::BadRequest.is_transient());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(ProviderErrorCode::from_status(401), ProviderErrorCode::AuthenticationFailed);
        assert_eq!(ProviderErrorCode::from_status(403), ProviderErrorCode::AuthorizationFailed);
        assert_eq!(ProviderErrorCode::from_status(404), ProviderErrorCode::NotFound);
        assert_eq!(ProviderErrorCode::from_status(410), ProviderErrorCode::NotFound);
        assert_eq!(ProviderErrorCode::from_status(422), ProviderErrorCode::BadRequest);
        assert_eq!(ProviderErrorCode::from_status(429), ProviderErrorCode::RateLimited);
        assert_eq!(ProviderErrorCode::from_status(503), ProviderErrorCode::ServerError);
    }

    #[test]
    fn from_status_keeps_status_and_body() {
        let err = ProviderError::from_status(400, "{\"error\":\"bad time\"}\n")
            .with_provider(ProviderKind::Microsoft);
        assert_eq!(err.status(), Some(400));
        assert!(err.is_rejected());
        assert!(!err.is_transient());
        let display = err.to_string();
        assert!(display.starts_with("[microsoft] bad_request"));
        assert!(display.contains("bad time"));
    }

    #[test]
    fn mismatch_names_both_sides() {
        let err = ProviderError::provider_mismatch(ProviderKind::Google, "microsoft");
        assert_eq!(err.code(), ProviderErrorCode::ProviderMismatch);
        assert_eq!(err.provider(), Some(ProviderKind::Google));
        assert!(err.message().contains("'microsoft'"));
    }

    #[test]
    fn with_source() {
        use std::error::Error;
        let io_err = std::io::Error::other("disk full");
        let err = ProviderError::internal("failed to persist").with_source(io_err);
        assert!(err.source().is_some());
    }
}
