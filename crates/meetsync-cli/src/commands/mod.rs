//! Command implementations.

pub mod availability;
pub mod config;
pub mod credential;
pub mod events;
pub mod linked;

use std::sync::Arc;

use meetsync_providers::{FileCredentialStore, ProviderRegistry};
use meetsync_service::{EventAggregator, EventCache};
use tracing::debug;

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};

/// Builds the registry over the configured providers and the credential file.
pub fn registry(config: &CliConfig) -> CliResult<Arc<ProviderRegistry>> {
    let path = config.credentials_path();
    debug!(path = %path.display(), "using credential file");
    let store = Arc::new(FileCredentialStore::new(path));
    let registry = ProviderRegistry::new(config.providers()?, store)?;
    Ok(Arc::new(registry))
}

pub fn aggregator(config: &CliConfig) -> CliResult<EventAggregator> {
    let aggregator = EventAggregator::new(registry(config)?);
    Ok(match config.cache_ttl() {
        Some(ttl) => aggregator.with_cache(EventCache::new(ttl)),
        None => aggregator,
    })
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    let out = serde_json::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))?;
    println!("{out}");
    Ok(())
}
