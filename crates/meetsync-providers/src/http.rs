//! Response handling shared by the provider clients.

use meetsync_core::ProviderKind;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, ProviderResult};

/// Upper bound on pages followed by one listing call.
pub(crate) const MAX_PAGES: usize = 100;

/// Fails once a listing has followed [`MAX_PAGES`] pages and the provider
/// still points at another one.
pub(crate) fn check_page_limit(provider: ProviderKind, pages: usize) -> ProviderResult<()> {
    if pages >= MAX_PAGES {
        return Err(ProviderError::invalid_response(format!(
            "listing did not finish after {pages} pages"
        ))
        .with_provider(provider));
    }
    Ok(())
}

/// Sends a request and turns transport failures and non-success statuses
/// into [`ProviderError`]s tagged with `provider`.
pub(crate) async fn send(provider: ProviderKind, request: RequestBuilder) -> ProviderResult<Response> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::from_transport(e).with_provider(provider))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = response.text().await.unwrap_or_default();
    let body = match retry_after {
        Some(secs) => format!("{body} (retry after {secs}s)"),
        None => body,
    };
    Err(ProviderError::from_status(status.as_u16(), &body).with_provider(provider))
}

/// Reads a JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    provider: ProviderKind,
    response: Response,
) -> ProviderResult<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::from_transport(e).with_provider(provider))?;
    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {e}"))
            .with_provider(provider)
            .with_source(e)
    })
}

/// Builds a reqwest client with the provider's per-call deadline.
pub(crate) fn build_client(
    provider: ProviderKind,
    timeout: std::time::Duration,
) -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(concat!("meetsync/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            ProviderError::configuration(format!("failed to build HTTP client: {e}"))
                .with_provider(provider)
                .with_source(e)
        })
}
