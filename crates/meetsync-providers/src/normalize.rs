//! RawEvent to CalendarEvent conversion.
//!
//! Rules shared by every provider:
//! 1. A timestamp field wins over a date-only field; a date-only value
//!    becomes midnight UTC of that date and marks the event all-day.
//! 2. Offset-less timestamps are read as UTC when the attached zone is UTC
//!    (or absent). Any other zone makes the value unparsable.
//! 3. An unparsable or missing start/end is handled per [`TimestampPolicy`].
//! 4. Recurrence rule lines are joined with `,` into one string.
//! 5. Empty strings become `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use meetsync_core::{CalendarEvent, ProviderKind, UserId};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawEvent, RawEventTime, non_empty};

/// What to do with a start or end time that cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampPolicy {
    /// Fail the fetch with an invalid-response error naming the event.
    #[default]
    Strict,
    /// Substitute [`zero_instant`] and log a warning.
    Lenient,
}

/// The instant `0001-01-01T00:00:00Z`, used for unparsable times under
/// [`TimestampPolicy::Lenient`].
pub fn zero_instant() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Zone names that mean UTC in Google and Graph payloads.
fn is_utc_zone(tz: &str) -> bool {
    matches!(
        tz.to_ascii_lowercase().as_str(),
        "utc" | "etc/utc" | "gmt" | "etc/gmt" | "z" | "tzone://microsoft/utc" | "coordinated universal time"
    )
}

/// Parses an RFC 3339 timestamp.
pub fn parse_rfc3339(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parses a provider time field into a UTC instant.
pub fn parse_event_time(time: &RawEventTime) -> Option<DateTime<Utc>> {
    if let Some(value) = non_empty(&time.date_time) {
        if let Some(dt) = parse_rfc3339(value) {
            return Some(dt);
        }
        let zone_is_utc = non_empty(&time.time_zone).is_none_or(is_utc_zone);
        if !zone_is_utc {
            return None;
        }
        return NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|dt| dt.and_utc());
    }

    non_empty(&time.date)
        .and_then(|value| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Joins recurrence rule lines into one comma-separated string.
pub fn flatten_recurrence(rules: &[String]) -> Option<String> {
    let rules: Vec<&str> = rules
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .collect();
    if rules.is_empty() {
        None
    } else {
        Some(rules.join(","))
    }
}

fn resolve_time(
    provider: ProviderKind,
    raw: &RawEvent,
    field: &'static str,
    time: &RawEventTime,
    policy: TimestampPolicy,
) -> ProviderResult<DateTime<Utc>> {
    if let Some(dt) = parse_event_time(time) {
        return Ok(dt);
    }
    let shown = non_empty(&time.date_time)
        .or_else(|| non_empty(&time.date))
        .unwrap_or("<missing>");
    match policy {
        TimestampPolicy::Strict => Err(ProviderError::invalid_response(format!(
            "event {} has unparsable {field} time '{shown}'",
            raw.id
        ))
        .with_provider(provider)),
        TimestampPolicy::Lenient => {
            warn!(
                provider = %provider,
                event_id = %raw.id,
                field,
                value = shown,
                "unparsable event time, using zero instant"
            );
            Ok(zero_instant())
        }
    }
}

/// Converts one [`RawEvent`] owned by `user` to a [`CalendarEvent`].
///
/// # Errors
///
/// Under [`TimestampPolicy::Strict`], returns an invalid-response error when
/// the start or end time is missing or unparsable.
pub fn normalize_event(
    user: UserId,
    provider: ProviderKind,
    raw: &RawEvent,
    policy: TimestampPolicy,
) -> ProviderResult<CalendarEvent> {
    let start = resolve_time(provider, raw, "start", &raw.start, policy)?;
    let end = resolve_time(provider, raw, "end", &raw.end, policy)?;

    let mut event = CalendarEvent::new(
        user,
        provider,
        &raw.id,
        non_empty(&raw.title).unwrap_or_default(),
        start,
        end,
    )
    .with_all_day(raw.is_all_day())
    .with_timestamps(
        non_empty(&raw.created).and_then(parse_rfc3339),
        non_empty(&raw.updated).and_then(parse_rfc3339),
    );

    if let Some(description) = non_empty(&raw.description) {
        event = event.with_description(description);
    }
    if let Some(location) = non_empty(&raw.location) {
        event = event.with_location(location);
    }
    if let Some(status) = non_empty(&raw.status) {
        event = event.with_status(status);
    }
    if let Some(visibility) = non_empty(&raw.visibility) {
        event = event.with_visibility(visibility);
    }
    if let Some(tz) = non_empty(&raw.start.time_zone) {
        event = event.with_time_zone(tz);
    }
    if let Some(recurrence) = flatten_recurrence(&raw.recurrence) {
        event = event.with_recurrence(recurrence);
    }

    Ok(event)
}

/// Normalizes a batch, stopping at the first strict-policy failure.
pub fn normalize_events(
    user: UserId,
    provider: ProviderKind,
    raws: &[RawEvent],
    policy: TimestampPolicy,
) -> ProviderResult<Vec<CalendarEvent>> {
    raws.iter()
        .map(|raw| normalize_event(user, provider, raw, policy))
        .collect()
}
