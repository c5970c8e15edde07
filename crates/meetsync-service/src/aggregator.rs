//! Event Aggregator: one user's events across every linked provider.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use futures::future::try_join_all;
use meetsync_core::{AvailabilityGrid, CalendarEvent, TimeWindow, UserId, build_availability};
use meetsync_providers::{CalendarProvider, Provider, ProviderRegistry};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::cache::EventCache;
use crate::error::ServiceResult;

/// Fetches and merges a user's events from all linked providers.
///
/// Fetches run concurrently. The first failing provider aborts the whole
/// aggregation with its error; no partial result is returned.
#[derive(Debug)]
pub struct EventAggregator {
    registry: Arc<ProviderRegistry>,
    cache: Option<Mutex<EventCache>>,
}

impl EventAggregator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: EventCache) -> Self {
        self.cache = Some(Mutex::new(cache));
        self
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// All events of `user`, ordered by start time, served from the cache
    /// when a fresh snapshot exists.
    pub async fn aggregate_events(&self, user: UserId) -> ServiceResult<Vec<CalendarEvent>> {
        if let Some(cache) = &self.cache
            && let Some(events) = cache.lock().await.get(user)
        {
            return Ok(events);
        }
        self.refresh(user).await
    }

    /// Like [`aggregate_events`](Self::aggregate_events), always going to the
    /// providers. Refreshes the cache on success.
    pub async fn refresh(&self, user: UserId) -> ServiceResult<Vec<CalendarEvent>> {
        let providers = self.registry.linked_providers(user).await?;
        if providers.is_empty() {
            debug!(user_id = %user, "no linked providers");
        }

        let batches = try_join_all(providers.iter().map(|p| self.fetch_one(user, p))).await?;
        let mut events: Vec<CalendarEvent> = batches.into_iter().flatten().collect();
        events.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(a.provider.cmp(&b.provider))
                .then_with(|| a.provider_event_id.cmp(&b.provider_event_id))
        });

        info!(
            user_id = %user,
            providers = providers.len(),
            events = events.len(),
            "aggregated events"
        );

        if let Some(cache) = &self.cache {
            cache.lock().await.store(user, &events);
        }
        Ok(events)
    }

    async fn fetch_one(&self, user: UserId, provider: &Provider) -> ServiceResult<Vec<CalendarEvent>> {
        let client = self.registry.client_for(user, provider).await?;
        let events = provider.fetch_events(user, &client).await?;
        debug!(user_id = %user, provider = provider.name(), count = events.len(), "fetched");
        Ok(events)
    }

    /// Drops the cached snapshot for `user`, if any.
    pub async fn invalidate(&self, user: UserId) {
        if let Some(cache) = &self.cache {
            cache.lock().await.invalidate(user);
        }
    }

    /// Free/busy grid of `user` over `window`, in `tz`.
    pub async fn availability<Tz: TimeZone>(
        &self,
        user: UserId,
        window: &TimeWindow,
        tz: &Tz,
    ) -> ServiceResult<AvailabilityGrid> {
        let events = self.aggregate_events(user).await?;
        Ok(build_availability(window, &events, tz))
    }

    /// Free/busy grid for `days` whole days starting at `now`'s local date.
    pub async fn availability_for_days<Tz: TimeZone>(
        &self,
        user: UserId,
        now: DateTime<Utc>,
        days: u32,
        tz: &Tz,
    ) -> ServiceResult<AvailabilityGrid> {
        let window = TimeWindow::days_from(now, days, tz);
        self.availability(user, &window, tz).await
    }
}
