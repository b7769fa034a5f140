use crate::domain::models::Task;
use crate::infrastructure::event_mapper::{
    CalendarEventDateTime, GoogleCalendarEvent, decode_task_event,
};
use crate::infrastructure::google_calendar_client::CalendarProvider;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Combines freshly fetched remote events into the local task list.
/// Remote events whose id already appears as some local task's
/// `calendar_event_id` are duplicates and excluded; the rest are
/// decoded and appended. Events that fail to decode are skipped.
pub fn merge_remote_events(tasks: &[Task], events: &[GoogleCalendarEvent]) -> Vec<Task> {
    let known_event_ids: HashSet<&str> = tasks
        .iter()
        .filter_map(|task| task.calendar_event_id.as_deref())
        .filter(|id| !id.trim().is_empty())
        .collect();

    let mut combined: Vec<Task> = tasks.to_vec();
    for event in events {
        let Some(event_id) = event.id.as_deref() else {
            continue;
        };
        if known_event_ids.contains(event_id) {
            continue;
        }
        match decode_task_event(event) {
            Ok(imported) => combined.push(imported),
            Err(error) => {
                tracing::warn!(event_id, %error, "skipping undecodable calendar event");
            }
        }
    }
    combined
}

/// Lists events in the given range, falling back to the built-in
/// sample data when the provider fails or returns nothing. A
/// deliberate degraded mode for the calendar view, not an error
/// handler: the error is logged and swallowed here only.
pub async fn fetch_events_or_sample<C>(
    provider: &C,
    access_token: &str,
    calendar_id: &str,
    time_min: DateTime<Utc>,
    time_max: DateTime<Utc>,
) -> Vec<GoogleCalendarEvent>
where
    C: CalendarProvider,
{
    match provider
        .list_events_in_range(access_token, calendar_id, time_min, time_max, None)
        .await
    {
        Ok(events) if !events.is_empty() => events,
        Ok(_) => {
            tracing::warn!("calendar listing returned no events, using sample data");
            sample_events()
        }
        Err(error) => {
            tracing::warn!(%error, "falling back to sample calendar data");
            sample_events()
        }
    }
}

/// Canned placeholder events shown while the calendar backend is
/// unreachable.
pub fn sample_events() -> Vec<GoogleCalendarEvent> {
    fn event(id: &str, summary: &str, description: &str, start: &str, end: &str) -> GoogleCalendarEvent {
        GoogleCalendarEvent {
            id: Some(id.to_string()),
            summary: Some(summary.to_string()),
            description: Some(description.to_string()),
            status: Some("confirmed".to_string()),
            created: None,
            color_id: None,
            start: CalendarEventDateTime {
                date_time: Some(start.to_string()),
                date: None,
                time_zone: None,
            },
            end: CalendarEventDateTime {
                date_time: Some(end.to_string()),
                date: None,
                time_zone: None,
            },
            reminders: None,
        }
    }

    vec![
        event(
            "sample-event-1",
            "Morning Focus Block",
            "Deep work session for sprint planning deck.",
            "2025-11-08T08:00:00-07:00",
            "2025-11-08T09:30:00-07:00",
        ),
        event(
            "sample-event-2",
            "Sprint Review Prep",
            "Outline key talking points for Monday's demo.",
            "2025-11-08T10:00:00-07:00",
            "2025-11-08T10:45:00-07:00",
        ),
        event(
            "sample-event-3",
            "Walk + Podcast",
            "30 minute recharge walk while listening to podcast queue.",
            "2025-11-09T12:30:00-07:00",
            "2025-11-09T13:15:00-07:00",
        ),
    ]
}
