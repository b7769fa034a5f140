use crate::infrastructure::error::CoreError;
use crate::infrastructure::event_mapper::GoogleCalendarEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use url::Url;

const CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3/";
const DEFAULT_UPCOMING_LIMIT: u32 = 50;
const DEFAULT_RANGE_LIMIT: u32 = 100;

/// The six calendar operations the core consumes. Everything else the
/// provider offers (OAuth, calendar management) belongs to the caller.
#[async_trait]
pub trait CalendarProvider: Send + Sync {
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<String, CoreError>;

    async fn get_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<GoogleCalendarEvent, CoreError>;

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<(), CoreError>;

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), CoreError>;

    async fn list_events_in_range(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: Option<u32>,
    ) -> Result<Vec<GoogleCalendarEvent>, CoreError>;

    async fn list_upcoming_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<GoogleCalendarEvent>, CoreError>;
}

#[derive(Debug, Clone, Default)]
pub struct ReqwestCalendarProvider {
    client: Client,
}

impl ReqwestCalendarProvider {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn ensure_non_empty(value: &str, field: &str) -> Result<(), CoreError> {
        if value.trim().is_empty() {
            return Err(CoreError::Provider(format!("{field} must not be empty")));
        }
        Ok(())
    }

    fn provider_http_error(status: reqwest::StatusCode, body: &str) -> CoreError {
        let message = if body.trim().is_empty() {
            format!("google calendar api error: http {}", status.as_u16())
        } else {
            format!(
                "google calendar api error: http {}; body={body}",
                status.as_u16()
            )
        };
        CoreError::Provider(message)
    }

    fn events_endpoint(calendar_id: &str) -> Result<Url, CoreError> {
        let mut url = Url::parse(CALENDAR_API_BASE).map_err(|error| {
            CoreError::Provider(format!("invalid calendar api base url: {error}"))
        })?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CoreError::Provider("calendar api base URL cannot be a base".to_string())
            })?;
            segments.push("calendars");
            segments.push(calendar_id);
            segments.push("events");
        }
        Ok(url)
    }

    fn event_endpoint(calendar_id: &str, event_id: &str) -> Result<Url, CoreError> {
        let mut url = Self::events_endpoint(calendar_id)?;
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                CoreError::Provider("calendar events URL cannot be a base".to_string())
            })?;
            segments.push(event_id);
        }
        Ok(url)
    }

    async fn list_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: Option<DateTime<Utc>>,
        max_results: u32,
    ) -> Result<Vec<GoogleCalendarEvent>, CoreError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = Self::events_endpoint(calendar_id)?;
        let mut page_token: Option<String> = None;
        let mut events = Vec::new();

        loop {
            let mut req = self
                .client
                .get(endpoint.clone())
                .bearer_auth(access_token)
                .query(&[
                    ("singleEvents", "true"),
                    ("orderBy", "startTime"),
                    ("showDeleted", "false"),
                ])
                .query(&[("maxResults", max_results)])
                .query(&[("timeMin", time_min.to_rfc3339())]);

            if let Some(time_max) = time_max {
                req = req.query(&[("timeMax", time_max.to_rfc3339())]);
            }
            if let Some(page_token) = page_token.as_deref() {
                req = req.query(&[("pageToken", page_token)]);
            }

            let response = req.send().await.map_err(|error| {
                CoreError::Provider(format!(
                    "network error while listing calendar events: {error}"
                ))
            })?;

            let status = response.status();
            let body = response.text().await.map_err(|error| {
                CoreError::Provider(format!("failed reading events list response: {error}"))
            })?;

            if !status.is_success() {
                return Err(Self::provider_http_error(status, &body));
            }

            let mut parsed: EventsPageResponse = serde_json::from_str(&body).map_err(|error| {
                CoreError::Provider(format!("invalid events list payload: {error}; body={body}"))
            })?;

            events.extend(parsed.items.take().unwrap_or_default());

            if let Some(next_page_token) = parsed.next_page_token.take() {
                page_token = Some(next_page_token);
                continue;
            }
            break;
        }

        Ok(events)
    }
}

#[derive(Debug, serde::Deserialize)]
struct EventsPageResponse {
    items: Option<Vec<GoogleCalendarEvent>>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

#[async_trait]
impl CalendarProvider for ReqwestCalendarProvider {
    async fn create_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<String, CoreError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;

        let endpoint = Self::events_endpoint(calendar_id)?;
        let response = self
            .client
            .post(endpoint)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|error| {
                CoreError::Provider(format!("network error while creating event: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Provider(format!("failed reading event create response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::provider_http_error(status, &body));
        }

        let parsed: GoogleCalendarEvent = serde_json::from_str(&body).map_err(|error| {
            CoreError::Provider(format!("invalid event create payload: {error}; body={body}"))
        })?;
        parsed
            .id
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                CoreError::Provider("event create response did not include id".to_string())
            })
    }

    async fn get_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<GoogleCalendarEvent, CoreError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;
        Self::ensure_non_empty(event_id, "event id")?;

        let endpoint = Self::event_endpoint(calendar_id, event_id)?;
        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                CoreError::Provider(format!("network error while fetching event: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Provider(format!("failed reading event get response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::provider_http_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|error| {
            CoreError::Provider(format!("invalid event payload: {error}; body={body}"))
        })
    }

    async fn update_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
        event: &GoogleCalendarEvent,
    ) -> Result<(), CoreError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;
        Self::ensure_non_empty(event_id, "event id")?;

        let endpoint = Self::event_endpoint(calendar_id, event_id)?;
        let response = self
            .client
            .put(endpoint)
            .bearer_auth(access_token)
            .json(event)
            .send()
            .await
            .map_err(|error| {
                CoreError::Provider(format!("network error while updating event: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Provider(format!("failed reading event update response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::provider_http_error(status, &body));
        }
        Ok(())
    }

    async fn delete_event(
        &self,
        access_token: &str,
        calendar_id: &str,
        event_id: &str,
    ) -> Result<(), CoreError> {
        Self::ensure_non_empty(access_token, "access token")?;
        Self::ensure_non_empty(calendar_id, "calendar id")?;
        Self::ensure_non_empty(event_id, "event id")?;

        let endpoint = Self::event_endpoint(calendar_id, event_id)?;
        let response = self
            .client
            .delete(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|error| {
                CoreError::Provider(format!("network error while deleting event: {error}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|error| {
            CoreError::Provider(format!("failed reading event delete response: {error}"))
        })?;

        if !status.is_success() {
            return Err(Self::provider_http_error(status, &body));
        }
        Ok(())
    }

    async fn list_events_in_range(
        &self,
        access_token: &str,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: Option<u32>,
    ) -> Result<Vec<GoogleCalendarEvent>, CoreError> {
        self.list_events(
            access_token,
            calendar_id,
            time_min,
            Some(time_max),
            max_results.unwrap_or(DEFAULT_RANGE_LIMIT),
        )
        .await
    }

    async fn list_upcoming_events(
        &self,
        access_token: &str,
        calendar_id: &str,
        max_results: Option<u32>,
    ) -> Result<Vec<GoogleCalendarEvent>, CoreError> {
        self.list_events(
            access_token,
            calendar_id,
            Utc::now(),
            None,
            max_results.unwrap_or(DEFAULT_UPCOMING_LIMIT),
        )
        .await
    }
}
