//! Per-user event snapshot cache with TTL.
//!
//! Snapshots are never authoritative: an expired or missing entry means the
//! aggregator fetches from the providers again.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use meetsync_core::{CalendarEvent, ProviderKind, UserId};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct CacheEntry {
    events: BTreeMap<(ProviderKind, String), CalendarEvent>,
    fetched_at: DateTime<Utc>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Event snapshots keyed by user.
#[derive(Debug)]
pub struct EventCache {
    ttl: Duration,
    entries: HashMap<UserId, CacheEntry>,
}

impl Default for EventCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl EventCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Replaces the snapshot for `user`.
    ///
    /// Events are upserted by `(provider, provider_event_id)`, so a provider
    /// repeating an event does not duplicate it.
    pub fn store(&mut self, user: UserId, events: &[CalendarEvent]) {
        let mut keyed = BTreeMap::new();
        for event in events {
            keyed.insert((event.provider, event.provider_event_id.clone()), event.clone());
        }
        debug!(user_id = %user, count = keyed.len(), "cached event snapshot");
        self.entries.insert(
            user,
            CacheEntry {
                events: keyed,
                fetched_at: Utc::now(),
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// The unexpired snapshot for `user`, ordered by start time.
    pub fn get(&self, user: UserId) -> Option<Vec<CalendarEvent>> {
        let entry = self.entries.get(&user).filter(|e| !e.is_expired())?;
        let mut events: Vec<_> = entry.events.values().cloned().collect();
        events.sort_by(|a, b| a.start.cmp(&b.start));
        trace!(user_id = %user, count = events.len(), "cache hit");
        Some(events)
    }

    /// When the unexpired snapshot for `user` was fetched.
    pub fn fetched_at(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.entries
            .get(&user)
            .filter(|e| !e.is_expired())
            .map(|e| e.fetched_at)
    }

    pub fn invalidate(&mut self, user: UserId) -> bool {
        self.entries.remove(&user).is_some()
    }

    /// Removes expired snapshots and returns how many were dropped.
    pub fn evict_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, "evicted expired snapshots");
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
