//! Time windows for event queries and availability grids.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a window would end before it starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("time window start {start} is after end {end}")]
pub struct InvalidWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// A time window in UTC.
///
/// Represents a half-open interval `[start, end)` for instant membership.
/// Span membership (see [`TimeWindow::contains_span`]) is closed on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWindow`] if `start` is after `end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InvalidWindow> {
        if start > end {
            return Err(InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// Creates a time window from a start time and a non-negative duration.
    ///
    /// Negative durations are clamped to an empty window.
    pub fn from_duration(start: DateTime<Utc>, duration: Duration) -> Self {
        let duration = duration.max(Duration::zero());
        Self {
            start,
            end: start + duration,
        }
    }

    /// Creates a window of `days` whole local days starting at midnight of
    /// the day containing `now` in `tz`. Both bounds are local midnights, so
    /// a day with a DST change is 23 or 25 hours long.
    ///
    /// Falls back to `now` and 24-hour days when a local midnight does not
    /// exist (DST gap).
    pub fn days_from<Tz: TimeZone>(now: DateTime<Utc>, days: u32, tz: &Tz) -> Self {
        let local_date = now.with_timezone(tz).date_naive();
        let start = local_midnight(tz, local_date).unwrap_or(now);
        let end = local_date
            .checked_add_days(Days::new(u64::from(days)))
            .and_then(|last| local_midnight(tz, last))
            .unwrap_or(start + Duration::days(i64::from(days)));
        Self::from_duration(start, end - start)
    }

    /// Returns the duration of this window.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Checks if an instant falls within this window, `[start, end)`.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if a whole span lies inside the window, `[start, end]`.
    ///
    /// A span that starts before the window or ends after it is not contained,
    /// even if it overlaps.
    pub fn contains_span(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start >= self.start && end <= self.end
    }

    /// Checks if a span overlaps this window at all.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start < self.end && end > self.start
    }

    /// Lists the calendar days covered by the window in `tz`.
    ///
    /// Steps the start's local wall-clock time forward one calendar day at a
    /// time, keeping each step whose instant is still before `end`.
    pub fn days_in<Tz: TimeZone>(&self, tz: &Tz) -> Vec<NaiveDate> {
        let wall = self.start.with_timezone(tz).naive_local();
        let mut days = Vec::new();
        for step in 0u64.. {
            let Some(local) = wall.checked_add_days(Days::new(step)) else {
                break;
            };
            let instant = tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
                .unwrap_or_else(|| self.start + Duration::days(step as i64));
            if instant >= self.end {
                break;
            }
            days.push(local.date());
        }
        days
    }
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|midnight| tz.from_local_datetime(&midnight).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, LocalResult, NaiveDateTime};

    /// UTC+1 until 2023-10-29T01:00Z, UTC afterwards; local 01:00-02:00 on
    /// that day happens twice.
    #[derive(Debug, Clone, Copy)]
    struct FallBack;

    impl FallBack {
        fn switch() -> NaiveDateTime {
            date(2023, 10, 29).and_hms_opt(1, 0, 0).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::east_opt(0).unwrap()
        }
    }

    impl TimeZone for FallBack {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            FallBack
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> LocalResult<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> LocalResult<FixedOffset> {
            let switch = Self::switch();
            if *local < switch {
                LocalResult::Single(Self::summer())
            } else if *local < switch + Duration::hours(1) {
                LocalResult::Ambiguous(Self::summer(), Self::winter())
            } else {
                LocalResult::Single(Self::winter())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::summer()
            } else {
                Self::winter()
            }
        }
    }

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn creation() {
        let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0)).unwrap();
        assert_eq!(window.duration(), Duration::hours(8));
    }

    #[test]
    fn invalid_window() {
        let err = TimeWindow::new(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 9, 0, 0)).unwrap_err();
        assert_eq!(err.start, utc(2025, 2, 5, 17, 0, 0));
    }

    #[test]
    fn contains_is_half_open() {
        let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0)).unwrap();
        assert!(window.contains(utc(2025, 2, 5, 9, 0, 0)));
        assert!(window.contains(utc(2025, 2, 5, 16, 59, 59)));
        assert!(!window.contains(utc(2025, 2, 5, 17, 0, 0)));
        assert!(!window.contains(utc(2025, 2, 5, 8, 59, 59)));
    }

    #[test]
    fn contains_span_rejects_partial_overlap() {
        let window = TimeWindow::new(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0)).unwrap();
        assert!(window.contains_span(utc(2025, 2, 5, 9, 0, 0), utc(2025, 2, 5, 17, 0, 0)));
        assert!(!window.contains_span(utc(2025, 2, 5, 8, 0, 0), utc(2025, 2, 5, 10, 0, 0)));
        assert!(window.overlaps(utc(2025, 2, 5, 8, 0, 0), utc(2025, 2, 5, 10, 0, 0)));
        assert!(!window.overlaps(utc(2025, 2, 5, 17, 0, 0), utc(2025, 2, 5, 18, 0, 0)));
    }

    #[test]
    fn days_in_steps_one_day_end_exclusive() {
        let window = TimeWindow::new(utc(2025, 2, 5, 0, 0, 0), utc(2025, 2, 8, 0, 0, 0)).unwrap();
        assert_eq!(
            window.days_in(&Utc),
            vec![date(2025, 2, 5), date(2025, 2, 6), date(2025, 2, 7)]
        );
    }

    #[test]
    fn days_from_starts_at_local_midnight() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let window = TimeWindow::days_from(utc(2025, 2, 5, 23, 30, 0), 14, &tz);
        // 23:30 UTC is already Feb 6 in UTC+2
        assert_eq!(window.start, utc(2025, 2, 5, 22, 0, 0));
        assert_eq!(window.duration(), Duration::days(14));
        assert_eq!(window.days_in(&tz).len(), 14);
        assert_eq!(window.days_in(&tz)[0], date(2025, 2, 6));
    }

    #[test]
    fn days_in_keeps_partial_last_step_out() {
        let window = TimeWindow::new(utc(2025, 2, 5, 10, 0, 0), utc(2025, 2, 7, 9, 0, 0)).unwrap();
        assert_eq!(window.days_in(&Utc), vec![date(2025, 2, 5), date(2025, 2, 6)]);
    }

    #[test]
    fn fall_back_day_is_not_dropped() {
        let window = TimeWindow::days_from(utc(2023, 10, 28, 12, 0, 0), 3, &FallBack);
        assert_eq!(window.start, utc(2023, 10, 27, 23, 0, 0));
        assert_eq!(window.end, utc(2023, 10, 31, 0, 0, 0));
        assert_eq!(window.duration(), Duration::hours(73));
        assert_eq!(
            window.days_in(&FallBack),
            vec![date(2023, 10, 28), date(2023, 10, 29), date(2023, 10, 30)]
        );
    }
}
