//! Microsoft Graph calendar calls and wire types.

use chrono::{DateTime, SecondsFormat, Utc};
use meetsync_core::{EventDetails, ProviderKind};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::provider::ProviderClient;
use crate::raw_event::{RawEvent, RawEventTime};

const PROVIDER: ProviderKind = ProviderKind::Microsoft;
const PREFER_UTC: &str = r#"outlook.timezone="UTC""#;

/// Graph's `dateTimeTimeZone` layout: offset-less, seven fractional digits.
fn graph_date_time(dt: DateTime<Utc>) -> String {
    format!("{}.0000000", dt.format("%Y-%m-%dT%H:%M:%S"))
}

pub(crate) struct GraphCalendarClient<'a> {
    pub client: &'a ProviderClient,
    pub base_url: &'a str,
}

impl GraphCalendarClient<'_> {
    fn events_url(&self) -> String {
        format!("{}/me/events", self.base_url)
    }

    /// Lists occurrences in `[start, end)` from the signed-in user's default
    /// calendar, following `@odata.nextLink`.
    pub async fn calendar_view(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page_size: u32,
    ) -> ProviderResult<Vec<RawEvent>> {
        let first = self
            .client
            .request(Method::GET, &format!("{}/me/calendarview", self.base_url))
            .query(&[
                ("startDateTime", start.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("endDateTime", end.to_rfc3339_opts(SecondsFormat::Secs, true)),
                ("$top", page_size.to_string()),
                ("$orderby", "start/dateTime".to_string()),
            ]);

        let mut request = Some(first);
        let mut events = Vec::new();
        let mut pages = 0usize;

        while let Some(req) = request.take() {
            let response = http::send(PROVIDER, req.header("Prefer", PREFER_UTC)).await?;
            let page: CalendarViewResponse = http::read_json(PROVIDER, response).await?;
            pages += 1;
            events.extend(page.value.into_iter().map(RawEvent::from));

            // nextLink is absolute and already carries the query
            if let Some(next) = page.next_link.filter(|l| !l.is_empty()) {
                http::check_page_limit(PROVIDER, pages)?;
                request = Some(self.client.request(Method::GET, &next));
            }
        }

        debug!(count = events.len(), pages, "fetched graph calendar view");
        Ok(events)
    }

    pub async fn create_event(&self, details: &EventDetails) -> ProviderResult<String> {
        let body = GraphNewEvent::from(details);
        let request = self.client.request(Method::POST, &self.events_url()).json(&body);
        let response = http::send(PROVIDER, request).await?;
        let created: GraphCreatedEvent = http::read_json(PROVIDER, response).await?;
        if created.id.is_empty() {
            return Err(ProviderError::invalid_response("created event has no id")
                .with_provider(PROVIDER));
        }
        Ok(created.id)
    }

    pub async fn delete_event(&self, event_id: &str) -> ProviderResult<()> {
        let url = format!("{}/{}", self.events_url(), urlencoding::encode(event_id));
        http::send(PROVIDER, self.client.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct CalendarViewResponse {
    #[serde(default)]
    value: Vec<GraphEvent>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GraphEvent {
    id: String,
    subject: Option<String>,
    body_preview: Option<String>,
    #[serde(default)]
    start: Option<GraphDateTime>,
    #[serde(default)]
    end: Option<GraphDateTime>,
    location: Option<GraphLocation>,
    #[serde(default)]
    is_all_day: bool,
    show_as: Option<String>,
    sensitivity: Option<String>,
    created_date_time: Option<String>,
    last_modified_date_time: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphDateTime {
    date_time: String,
    time_zone: Option<String>,
}

impl From<Option<GraphDateTime>> for RawEventTime {
    fn from(time: Option<GraphDateTime>) -> Self {
        match time {
            Some(t) => Self {
                date_time: Some(t.date_time),
                date: None,
                time_zone: t.time_zone,
            },
            None => Self::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphLocation {
    display_name: Option<String>,
}

impl From<GraphEvent> for RawEvent {
    fn from(event: GraphEvent) -> Self {
        Self {
            id: event.id,
            title: event.subject,
            description: event.body_preview,
            location: event.location.and_then(|l| l.display_name),
            start: event.start.into(),
            end: event.end.into(),
            all_day: Some(event.is_all_day),
            status: event.show_as,
            visibility: event.sensitivity,
            // calendarview returns occurrences, which carry no pattern
            recurrence: Vec::new(),
            created: event.created_date_time,
            updated: event.last_modified_date_time,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphNewEvent {
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<GraphBody>,
    start: GraphDateTime,
    end: GraphDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<GraphLocation>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GraphBody {
    content_type: &'static str,
    content: String,
}

impl From<&EventDetails> for GraphNewEvent {
    fn from(details: &EventDetails) -> Self {
        let at = |dt| GraphDateTime {
            date_time: graph_date_time(dt),
            time_zone: Some("UTC".to_string()),
        };
        Self {
            subject: details.title.clone(),
            body: details.description.clone().map(|content| GraphBody {
                content_type: "HTML",
                content,
            }),
            start: at(details.start),
            end: at(details.end),
            location: details.location.clone().map(|name| GraphLocation {
                display_name: Some(name),
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
struct GraphCreatedEvent {
    #[serde(default)]
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn graph_time_layout() {
        let dt = Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap();
        assert_eq!(graph_date_time(dt), "2023-06-02T10:00:00.0000000");
    }

    #[test]
    fn parse_calendar_view_page() {
        let json = r#"{
            "@odata.context": "https://graph.microsoft.com/v1.0/$metadata#users('x')/calendarView",
            "@odata.nextLink": "https://graph.microsoft.com/v1.0/me/calendarview?$skip=10",
            "value": [{
                "id": "AAMk1",
                "subject": "Review",
                "bodyPreview": "Agenda",
                "start": { "dateTime": "2023-06-02T10:00:00.0000000", "timeZone": "UTC" },
                "end": { "dateTime": "2023-06-02T11:00:00.0000000", "timeZone": "UTC" },
                "location": { "displayName": "Room 7" },
                "isAllDay": false,
                "showAs": "busy",
                "createdDateTime": "2023-05-01T08:00:00.1234567Z"
            }]
        }"#;

        let page: CalendarViewResponse = serde_json::from_str(json).unwrap();
        assert!(page.next_link.is_some());
        let raw = RawEvent::from(page.value.into_iter().next().unwrap());
        assert_eq!(raw.description.as_deref(), Some("Agenda"));
        assert_eq!(raw.location.as_deref(), Some("Room 7"));
        assert_eq!(raw.start.time_zone.as_deref(), Some("UTC"));
        assert_eq!(raw.all_day, Some(false));
        assert_eq!(raw.status.as_deref(), Some("busy"));
    }

    #[test]
    fn new_event_body_uses_html_and_utc() {
        let details = EventDetails::new(
            "Sync",
            Utc.with_ymd_and_hms(2023, 6, 2, 10, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 6, 2, 12, 0, 0).unwrap(),
        )
        .with_description("Quarterly")
        .with_location("HQ");

        let body = serde_json::to_value(GraphNewEvent::from(&details)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "subject": "Sync",
                "body": { "contentType": "HTML", "content": "Quarterly" },
                "start": { "dateTime": "2023-06-02T10:00:00.0000000", "timeZone": "UTC" },
                "end": { "dateTime": "2023-06-02T12:00:00.0000000", "timeZone": "UTC" },
                "location": { "displayName": "HQ" }
            })
        );
    }
}
