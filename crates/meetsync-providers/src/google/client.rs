//! Google Calendar API v3 calls and wire types.

use chrono::{DateTime, Utc};
use meetsync_core::{EventDetails, ProviderKind};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::ProviderClient;
use crate::raw_event::{RawEvent, RawEventTime};

const PROVIDER: ProviderKind = ProviderKind::Google;

/// Calls against one calendar, on behalf of one authenticated user.
pub(crate) struct GoogleCalendarClient<'a> {
    pub client: &'a ProviderClient,
    pub base_url: &'a str,
    pub calendar_id: &'a str,
}

impl GoogleCalendarClient<'_> {
    fn events_url(&self) -> String {
        format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(self.calendar_id)
        )
    }

    /// Lists single (expanded) events starting in `[time_min, time_max)`,
    /// following `nextPageToken` until exhausted.
    pub async fn list_events(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        page_size: u32,
    ) -> ProviderResult<Vec<RawEvent>> {
        let url = self.events_url();
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let mut request = self.client.request(Method::GET, &url).query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("showDeleted", "false".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", page_size.to_string()),
            ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token)]);
            }

            let response = http::send(PROVIDER, request).await?;
            let page: EventListResponse = http::read_json(PROVIDER, response).await?;
            pages += 1;
            events.extend(page.items.into_iter().map(RawEvent::from));

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => {
                    http::check_page_limit(PROVIDER, pages)?;
                    page_token = Some(token);
                }
                None => break,
            }
        }

        debug!(
            calendar_id = self.calendar_id,
            count = events.len(),
            pages,
            "fetched google events"
        );
        Ok(events)
    }

    /// Inserts one event and returns its id.
    pub async fn insert_event(&self, details: &EventDetails) -> ProviderResult<String> {
        let body = InsertEventRequest::from(details);
        let request = self.client.request(Method::POST, &self.events_url()).json(&body);
        let response = http::send(PROVIDER, request).await?;
        let created: CreatedEvent = http::read_json(PROVIDER, response).await?;
        if created.id.is_empty() {
            return Err(ProviderError::invalid_response("created event has no id")
                .with_provider(PROVIDER));
        }
        Ok(created.id)
    }

    /// Deletes one event.
    pub async fn delete_event(&self, event_id: &str) -> ProviderResult<()> {
        let url = format!("{}/{}", self.events_url(), urlencoding::encode(event_id));
        let request = self.client.request(Method::DELETE, &url);
        http::send(PROVIDER, request).await?;
        Ok(())
    }
}

/// Response from the events.list endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

/// A single event from the Google Calendar API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: String,
    summary: Option<String>,
    description: Option<String>,
    location: Option<String>,
    #[serde(default)]
    start: ApiEventTime,
    #[serde(default)]
    end: ApiEventTime,
    status: Option<String>,
    visibility: Option<String>,
    #[serde(default)]
    recurrence: Vec<String>,
    created: Option<String>,
    updated: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    time_zone: Option<String>,
}

impl From<ApiEventTime> for RawEventTime {
    fn from(time: ApiEventTime) -> Self {
        Self {
            date_time: time.date_time,
            date: time.date,
            time_zone: time.time_zone,
        }
    }
}

impl From<ApiEvent> for RawEvent {
    fn from(event: ApiEvent) -> Self {
        Self {
            id: event.id,
            title: event.summary,
            description: event.description,
            location: event.location,
            start: event.start.into(),
            end: event.end.into(),
            // derived from a date-only start
            all_day: None,
            status: event.status,
            visibility: event.visibility,
            recurrence: event.recurrence,
            created: event.created,
            updated: event.updated,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InsertEventRequest {
    summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
}

impl From<&EventDetails> for InsertEventRequest {
    fn from(details: &EventDetails) -> Self {
        let at = |dt: DateTime<Utc>| ApiEventTime {
            date_time: Some(dt.to_rfc3339()),
            ..ApiEventTime::default()
        };
        Self {
            summary: details.title.clone(),
            description: details.description.clone(),
            location: details.location.clone(),
            start: at(details.start),
            end: at(details.end),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedEvent {
    #[serde(default)]
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parse_event_list_response() {
        let json = r#"{
            "items": [
                {
                    "id": "event1",
                    "summary": "Test Meeting",
                    "start": { "dateTime": "2024-03-15T10:00:00Z", "timeZone": "Europe/Paris" },
                    "end": { "dateTime": "2024-03-15T11:00:00Z" },
                    "status": "confirmed",
                    "recurrence": ["RRULE:FREQ=DAILY"]
                }
            ],
            "nextPageToken": "p2"
        }"#;

        let response: EventListResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_page_token.as_deref(), Some("p2"));
        let raw = RawEvent::from(response.items.into_iter().next().unwrap());
        assert_eq!(raw.title.as_deref(), Some("Test Meeting"));
        assert_eq!(raw.start.time_zone.as_deref(), Some("Europe/Paris"));
        assert_eq!(raw.recurrence, vec!["RRULE:FREQ=DAILY".to_string()]);
        assert!(!raw.is_all_day());
    }

    #[test]
    fn parse_all_day_event() {
        let json = r#"{
            "id": "event1",
            "summary": "All Day Event",
            "start": { "date": "2024-03-15" },
            "end": { "date": "2024-03-16" }
        }"#;

        let raw = RawEvent::from(serde_json::from_str::<ApiEvent>(json).unwrap());
        assert!(raw.is_all_day());
        assert_eq!(raw.start.date.as_deref(), Some("2024-03-15"));
    }

    #[test]
    fn insert_body_uses_rfc3339_and_skips_empty_fields() {
        let details = EventDetails::new(
            "Sync",
            Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 2, 12, 0, 0).unwrap(),
        )
        .with_location("Room 4");
        let body = serde_json::to_value(InsertEventRequest::from(&details)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "summary": "Sync",
                "location": "Room 4",
                "start": { "dateTime": "2023-06-02T10:00:00+00:00" },
                "end": { "dateTime": "2023-06-02T12:00:00+00:00" }
            })
        );
    }
}
