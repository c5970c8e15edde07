//! Raw event data as it comes from a provider, before normalization.
//!
//! Times are kept as the strings the provider sent so that parse failures
//! are handled in one place, by [`crate::normalize`].

/// A provider time field.
///
/// Providers send either a timestamp or, for all-day events, a bare date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEventTime {
    /// A timestamp, RFC 3339 or an offset-less local time.
    pub date_time: Option<String>,
    /// A `YYYY-MM-DD` date for all-day events.
    pub date: Option<String>,
    /// The IANA or Windows zone name the provider attached.
    pub time_zone: Option<String>,
}

impl RawEventTime {
    pub fn date_time(value: impl Into<String>) -> Self {
        Self {
            date_time: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn with_time_zone(mut self, tz: impl Into<String>) -> Self {
        self.time_zone = Some(tz.into());
        self
    }

    /// True if only a date-only value is present.
    pub fn is_date_only(&self) -> bool {
        non_empty(&self.date_time).is_none() && non_empty(&self.date).is_some()
    }
}

/// A raw calendar event from a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawEvent {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: RawEventTime,
    pub end: RawEventTime,
    /// Explicit all-day flag; when `None` it is derived from the start time.
    pub all_day: Option<bool>,
    pub status: Option<String>,
    pub visibility: Option<String>,
    /// Recurrence rule lines (e.g. `RRULE:FREQ=WEEKLY`).
    pub recurrence: Vec<String>,
    pub created: Option<String>,
    pub updated: Option<String>,
}

impl RawEvent {
    pub fn new(id: impl Into<String>, start: RawEventTime, end: RawEventTime) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Whether this is an all-day event.
    pub fn is_all_day(&self) -> bool {
        self.all_day.unwrap_or_else(|| self.start.is_date_only())
    }
}

/// Returns the trimmed value if it is present and non-empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_day_is_derived_from_date_only_start() {
        let event = RawEvent::new("a", RawEventTime::date("2023-06-02"), RawEventTime::date("2023-06-03"));
        assert!(event.is_all_day());

        let timed = RawEvent::new(
            "b",
            RawEventTime::date_time("2023-06-02T10:00:00Z"),
            RawEventTime::date_time("2023-06-02T11:00:00Z"),
        );
        assert!(!timed.is_all_day());
    }

    #[test]
    fn explicit_flag_wins() {
        let mut event = RawEvent::new(
            "a",
            RawEventTime::date_time("2023-06-02T00:00:00.0000000"),
            RawEventTime::date_time("2023-06-03T00:00:00.0000000"),
        );
        event.all_day = Some(true);
        assert!(event.is_all_day());
    }

    #[test]
    fn empty_strings_do_not_count() {
        let time = RawEventTime {
            date_time: Some(String::new()),
            date: Some("2023-06-02".into()),
            time_zone: None,
        };
        assert!(time.is_date_only());
    }
}
