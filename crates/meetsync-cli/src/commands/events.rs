//! `meetsync events`

use chrono::Local;
use meetsync_core::{CalendarEvent, UserId};

use crate::config::CliConfig;
use crate::error::CliResult;

#[derive(Debug, Clone, Copy, Default)]
pub struct EventFilter {
    pub skip_all_day: bool,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn apply(&self, events: Vec<CalendarEvent>) -> Vec<CalendarEvent> {
        events
            .into_iter()
            .filter(|e| !(self.skip_all_day && e.is_all_day))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

pub async fn run(config: &CliConfig, user: UserId, filter: EventFilter, json: bool) -> CliResult<()> {
    let events = filter.apply(super::aggregator(config)?.aggregate_events(user).await?);

    if json {
        return super::print_json(&events);
    }
    if events.is_empty() {
        println!("No events");
    }
    for event in &events {
        println!("{}", format_line(event));
    }
    Ok(())
}

fn format_line(event: &CalendarEvent) -> String {
    let start = event.start.with_timezone(&Local);
    let end = event.end.with_timezone(&Local);
    let when = if event.is_all_day {
        format!("{} all day  ", start.format("%a %Y-%m-%d"))
    } else {
        format!("{} {}-{}", start.format("%a %Y-%m-%d"), start.format("%H:%M"), end.format("%H:%M"))
    };
    format!("{when}  [{}] {}", event.provider, event.title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use meetsync_core::ProviderKind;

    fn event(id: &str, all_day: bool) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap();
        CalendarEvent::new(UserId(1), ProviderKind::Google, id, id, start, start + Duration::hours(1))
            .with_all_day(all_day)
    }

    #[test]
    fn filter_skips_all_day_then_limits() {
        let filter = EventFilter {
            skip_all_day: true,
            limit: Some(1),
        };
        let kept = filter.apply(vec![event("holiday", true), event("a", false), event("b", false)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].provider_event_id, "a");
    }

    #[test]
    fn default_filter_keeps_everything() {
        let kept = EventFilter::default().apply(vec![event("holiday", true), event("a", false)]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn line_names_provider_and_title() {
        let line = format_line(&event("Standup", false));
        assert!(line.contains("[google] Standup"));
    }
}
