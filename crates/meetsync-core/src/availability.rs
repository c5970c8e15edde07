//! Per-day, per-hour free/busy grid.
//!
//! [`build_availability`] turns a set of normalized events into an
//! [`AvailabilityGrid`] covering every calendar day of a [`TimeWindow`].
//!
//! Marking rules:
//! - Events whose start or end falls outside the window are skipped, not clipped.
//! - Every hour from the local start hour through the local end hour
//!   (inclusive) is busy on the event's start day.
//! - Events that end on a later day mark the start day through hour 23 and
//!   leave the following day untouched.

use chrono::{DateTime, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::event::CalendarEvent;
use crate::time::TimeWindow;

/// Number of hour slots in one day.
pub const HOURS_PER_DAY: usize = 24;

/// State of one hour slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotState {
    #[default]
    Free,
    Busy,
}

/// The hourly grid of a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub hours: [SlotState; HOURS_PER_DAY],
}

impl DayAvailability {
    /// Creates a day with every hour free.
    pub fn free(date: NaiveDate) -> Self {
        Self {
            date,
            hours: [SlotState::Free; HOURS_PER_DAY],
        }
    }

    /// Returns the busy hours of this day in ascending order.
    pub fn busy_hours(&self) -> Vec<u32> {
        self.hours_in(SlotState::Busy)
    }

    /// Returns the free hours of this day in ascending order.
    pub fn free_hours(&self) -> Vec<u32> {
        self.hours_in(SlotState::Free)
    }

    fn hours_in(&self, state: SlotState) -> Vec<u32> {
        (0u32..)
            .zip(self.hours.iter())
            .filter(|(_, slot)| **slot == state)
            .map(|(hour, _)| hour)
            .collect()
    }

    fn mark_busy(&mut self, from: u32, through: u32) {
        for hour in from..=through.min(HOURS_PER_DAY as u32 - 1) {
            self.hours[hour as usize] = SlotState::Busy;
        }
    }
}

/// Free/busy grid over consecutive days.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AvailabilityGrid {
    pub days: Vec<DayAvailability>,
}

impl AvailabilityGrid {
    /// Returns the grid for a given date, if the window covers it.
    pub fn day(&self, date: NaiveDate) -> Option<&DayAvailability> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Returns the state of one slot, or `None` if the slot is outside the grid.
    pub fn slot(&self, date: NaiveDate, hour: u32) -> Option<SlotState> {
        self.day(date)
            .and_then(|d| d.hours.get(hour as usize))
            .copied()
    }

    /// Returns `true` if the slot is inside the grid and free.
    pub fn is_free(&self, date: NaiveDate, hour: u32) -> bool {
        self.slot(date, hour) == Some(SlotState::Free)
    }

    /// Counts busy slots across all days.
    pub fn busy_count(&self) -> usize {
        self.days
            .iter()
            .flat_map(|d| d.hours.iter())
            .filter(|s| **s == SlotState::Busy)
            .count()
    }

    fn day_mut(&mut self, date: NaiveDate) -> Option<&mut DayAvailability> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    /// Marks one event on the grid, following the module-level rules.
    ///
    /// Returns `false` if the event was skipped.
    pub fn mark_event<Tz: TimeZone>(
        &mut self,
        window: &TimeWindow,
        event: &CalendarEvent,
        tz: &Tz,
    ) -> bool {
        if !window.contains_span(event.start, event.end) {
            return false;
        }

        let start = event.start.with_timezone(tz);
        let end = event.end.with_timezone(tz);
        let start_date = start.date_naive();
        let through = if end.date_naive() > start_date {
            HOURS_PER_DAY as u32 - 1
        } else {
            end.hour()
        };

        match self.day_mut(start_date) {
            Some(day) => {
                day.mark_busy(start.hour(), through);
                true
            }
            None => false,
        }
    }
}

/// Builds the free/busy grid for `window` from `events`, computing local
/// dates and hours in `tz`.
///
/// The result does not depend on the order of `events`.
pub fn build_availability<Tz: TimeZone>(
    window: &TimeWindow,
    events: &[CalendarEvent],
    tz: &Tz,
) -> AvailabilityGrid {
    let mut grid = AvailabilityGrid {
        days: window
            .days_in(tz)
            .into_iter()
            .map(DayAvailability::free)
            .collect(),
    };

    let skipped = events
        .iter()
        .filter(|event| !grid.mark_event(window, event, tz))
        .count();

    tracing::trace!(
        days = grid.days.len(),
        events = events.len(),
        skipped,
        "built availability grid"
    );
    grid
}

/// Convenience wrapper over [`build_availability`] for a UTC start and day count.
pub fn build_availability_for_days<Tz: TimeZone>(
    start: DateTime<Utc>,
    days: u32,
    events: &[CalendarEvent],
    tz: &Tz,
) -> AvailabilityGrid {
    let window = TimeWindow::days_from(start, days, tz);
    build_availability(&window, events, tz)
}
