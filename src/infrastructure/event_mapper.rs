use crate::domain::models::{Priority, Task};
use crate::infrastructure::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;

const COMPLETED_MARKER: &str = "✅";
const COLOR_COMPLETED: &str = "8";
const EVENT_FOOTER: &str = "📱 Created via FocusMate";
const REMINDER_MINUTES: [u32; 2] = [30, 10];
pub const IMPORT_SOURCE: &str = "google_calendar";

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CalendarEventDateTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "timeZone", skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventReminderOverride {
    pub method: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct EventReminders {
    #[serde(rename = "useDefault")]
    pub use_default: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<EventReminderOverride>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct GoogleCalendarEvent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(rename = "colorId", skip_serializing_if = "Option::is_none")]
    pub color_id: Option<String>,
    pub start: CalendarEventDateTime,
    pub end: CalendarEventDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminders: Option<EventReminders>,
}

/// Maps a task onto a calendar event. The event span is the fixed
/// priority duration (60/45/30 minutes), never `estimated_minutes`.
pub fn encode_task_event(task: &Task, time_zone: Option<Tz>) -> GoogleCalendarEvent {
    let start = task.due_instant().unwrap_or(task.created_at);
    let end = start + Duration::minutes(task.priority.event_duration_minutes());
    let time_zone = time_zone.map(|tz| tz.name().to_string());

    GoogleCalendarEvent {
        id: None,
        summary: Some(task.action.clone()),
        description: Some(build_event_description(task)),
        status: None,
        created: None,
        color_id: Some(task.priority.color_id().to_string()),
        start: CalendarEventDateTime {
            date_time: Some(start.to_rfc3339()),
            date: None,
            time_zone: time_zone.clone(),
        },
        end: CalendarEventDateTime {
            date_time: Some(end.to_rfc3339()),
            date: None,
            time_zone,
        },
        reminders: Some(EventReminders {
            use_default: false,
            overrides: REMINDER_MINUTES
                .iter()
                .map(|minutes| EventReminderOverride {
                    method: "popup".to_string(),
                    minutes: *minutes,
                })
                .collect(),
        }),
    }
}

/// Narrative metadata folded into the event description, in contract
/// order: transcript quote, priority, confidence percentage,
/// rationale, footer.
pub fn build_event_description(task: &Task) -> String {
    let mut description = String::new();

    if let Some(transcript) = task
        .transcript
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        description.push_str(&format!("🎙️ From Voice: \"{transcript}\"\n\n"));
    }

    description.push_str(&format!("📋 Priority: {}\n", task.priority.as_str()));
    description.push_str(&format!(
        "🤖 Confidence: {}%\n",
        (task.confidence * 100.0).round() as i64
    ));

    if let Some(rationale) = task
        .rationale
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
    {
        description.push_str(&format!("💡 Rationale: {rationale}\n"));
    }

    description.push_str(&format!("\n{EVENT_FOOTER}"));
    description
}

/// Inverse mapping. Lossy by contract: `estimated_minutes` is
/// recomputed from the event span and need not match any original
/// estimate. Imported events are never marked completed.
pub fn decode_task_event(event: &GoogleCalendarEvent) -> Result<Task, CoreError> {
    let event_id = event
        .id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| CoreError::Validation("calendar event id is required".to_string()))?;

    let start = resolve_instant(&event.start, "start")?;
    let end = resolve_instant(&event.end, "end")?;
    if end < start {
        return Err(CoreError::Validation(
            "calendar event end is before start".to_string(),
        ));
    }

    let created_at = event
        .created
        .as_deref()
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or(start);

    Ok(Task {
        id: event_id.to_string(),
        created_at,
        action: event
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or("Untitled Event")
            .to_string(),
        due_date: Some(start.date_naive()),
        due_time: event.start.date_time.as_ref().map(|_| start.time()),
        due_datetime: Some(start),
        estimated_minutes: Some((end - start).num_minutes() as u32),
        calendar_event_id: Some(event_id.to_string()),
        scheduled_start: Some(start),
        scheduled_end: Some(end),
        priority: event
            .color_id
            .as_deref()
            .map(Priority::from_color_id)
            .unwrap_or_default(),
        completed: false,
        confidence: 1.0,
        transcript: event.description.clone(),
        rationale: Some("Imported from Google Calendar".to_string()),
        source: Some(IMPORT_SOURCE.to_string()),
    })
}

/// Overlays the completion marker: title prefix and the fixed
/// completed color. No other field is touched.
pub fn mark_event_completed(event: &mut GoogleCalendarEvent, task: &Task) {
    event.summary = Some(format!("{COMPLETED_MARKER} {}", task.action));
    event.color_id = Some(COLOR_COMPLETED.to_string());
}

fn resolve_instant(
    value: &CalendarEventDateTime,
    field_name: &str,
) -> Result<DateTime<Utc>, CoreError> {
    if let Some(date_time) = value.date_time.as_deref() {
        return DateTime::parse_from_rfc3339(date_time)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(|error| {
                CoreError::Validation(format!(
                    "invalid calendar event {field_name}.dateTime '{date_time}': {error}"
                ))
            });
    }
    if let Some(date) = value.date.as_deref() {
        let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|error| {
            CoreError::Validation(format!(
                "invalid calendar event {field_name}.date '{date}': {error}"
            ))
        })?;
        return Ok(parsed.and_time(chrono::NaiveTime::MIN).and_utc());
    }
    Err(CoreError::Validation(format!(
        "calendar event {field_name} has no timestamp"
    )))
}
