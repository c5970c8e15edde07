//! Calendar event types.
//!
//! This module provides the provider-agnostic event model:
//! - [`ProviderKind`]: The closed set of supported calendar providers
//! - [`CalendarEvent`]: A normalized remote calendar entry owned by one user

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::UserId;

/// The calendar providers a user can link.
///
/// The set is closed: supporting a new provider means adding a variant here
/// and a matching provider implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Calendar.
    Google,
    /// Microsoft Outlook via the Graph API.
    Microsoft,
}

impl ProviderKind {
    /// Every supported provider, in a stable order.
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Google, ProviderKind::Microsoft];

    /// Returns the stable provider tag.
    ///
    /// This is the value persisted in appointment-event rows and used as the
    /// credential store key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Microsoft => "microsoft",
        }
    }

    /// Returns a human-readable name for this provider.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Google => "Google Calendar",
            Self::Microsoft => "Microsoft Outlook",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a provider tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown calendar provider: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "microsoft" => Ok(Self::Microsoft),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

/// A normalized calendar event.
///
/// Events are snapshots of provider data: the provider stays the source of
/// truth and the pair `(provider, provider_event_id)` identifies an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    /// The user whose calendar holds this event.
    pub user_id: UserId,
    /// The provider the event was fetched from.
    pub provider: ProviderKind,
    /// The provider-native event identifier.
    pub provider_event_id: String,
    /// The event title.
    pub title: String,
    /// The event description.
    pub description: Option<String>,
    /// When the event starts.
    pub start: DateTime<Utc>,
    /// When the event ends.
    pub end: DateTime<Utc>,
    /// The event location.
    pub location: Option<String>,
    /// Whether this is an all-day event.
    pub is_all_day: bool,
    /// Provider status string (e.g. "confirmed").
    pub status: Option<String>,
    /// Provider visibility string (e.g. "private").
    pub visibility: Option<String>,
    /// Recurrence rules flattened into a single comma-joined string.
    pub recurrence: Option<String>,
    /// The source timezone identifier, if the provider reported one.
    pub time_zone: Option<String>,
    /// When the event was created at the provider.
    pub created_at: Option<DateTime<Utc>>,
    /// When the event was last updated at the provider.
    pub updated_at: Option<DateTime<Utc>>,
}

impl CalendarEvent {
    /// Creates a new event with the required fields.
    pub fn new(
        user_id: UserId,
        provider: ProviderKind,
        provider_event_id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            provider,
            provider_event_id: provider_event_id.into(),
            title: title.into(),
            description: None,
            start,
            end,
            location: None,
            is_all_day: false,
            status: None,
            visibility: None,
            recurrence: None,
            time_zone: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Returns the `(provider, provider_event_id)` identity of this event.
    pub fn key(&self) -> (ProviderKind, &str) {
        (self.provider, &self.provider_event_id)
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to mark as all-day.
    pub fn with_all_day(mut self, is_all_day: bool) -> Self {
        self.is_all_day = is_all_day;
        self
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to set the visibility.
    pub fn with_visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }

    /// Builder method to set the flattened recurrence string.
    pub fn with_recurrence(mut self, recurrence: impl Into<String>) -> Self {
        self.recurrence = Some(recurrence.into());
        self
    }

    /// Builder method to set the source timezone.
    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = Some(tz.into());
        self
    }

    /// Builder method to set creation and update timestamps.
    pub fn with_timestamps(
        mut self,
        created_at: Option<DateTime<Utc>>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    /// Returns the event duration.
    pub fn duration(&self) -> chrono::Duration {
        self.end - self.start
    }
}
