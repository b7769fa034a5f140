use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Task priority. Unrecognized values deserialize as `Medium`, the
/// default applied at every ingestion boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Priority::High,
            "low" => Priority::Low,
            _ => Priority::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Additive urgency weight: lower schedules earlier.
    pub fn weight(&self) -> i64 {
        match self {
            Priority::High => 0,
            Priority::Medium => 10,
            Priority::Low => 20,
        }
    }

    /// Calendar event length by priority. Deliberately independent of
    /// a task's `estimated_minutes`.
    pub fn event_duration_minutes(&self) -> i64 {
        match self {
            Priority::High => 60,
            Priority::Medium => 45,
            Priority::Low => 30,
        }
    }

    /// Google Calendar color id (red / yellow / green).
    pub fn color_id(&self) -> &'static str {
        match self {
            Priority::High => "11",
            Priority::Medium => "5",
            Priority::Low => "2",
        }
    }

    /// Inverse of `color_id`; unknown colors map to `Medium`.
    pub fn from_color_id(color_id: &str) -> Self {
        match color_id.trim() {
            "11" => Priority::High,
            "5" => Priority::Medium,
            "2" => Priority::Low,
            _ => Priority::Medium,
        }
    }
}

impl From<String> for Priority {
    fn from(value: String) -> Self {
        Priority::parse(&value)
    }
}

impl From<Priority> for String {
    fn from(value: Priority) -> Self {
        value.as_str().to_string()
    }
}

pub const DEFAULT_ESTIMATE_MINUTES: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_time: Option<NaiveTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_datetime: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_start: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

fn default_confidence() -> f64 {
    1.0
}

impl Task {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "task.id")?;
        validate_non_empty(&self.action, "task.action")?;
        if let (Some(start), Some(end)) = (self.scheduled_start, self.scheduled_end) {
            if end < start {
                return Err("task.scheduled_end must be >= task.scheduled_start".to_string());
            }
        }
        Ok(())
    }

    /// Derived status string; `completed` is the authoritative field.
    pub fn status(&self) -> &'static str {
        if self.completed { "done" } else { "todo" }
    }

    /// Duration estimate in minutes; absent or zero estimates clamp to
    /// the 30-minute default.
    pub fn effective_estimate(&self) -> u32 {
        match self.estimated_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => DEFAULT_ESTIMATE_MINUTES,
        }
    }

    /// Authoritative due timestamp. `due_datetime` wins; a bare
    /// `due_time` is combined with `due_date` when present, otherwise
    /// with the task's creation date.
    pub fn due_instant(&self) -> Option<DateTime<Utc>> {
        if let Some(due) = self.due_datetime {
            return Some(due);
        }
        if let Some(date) = self.due_date {
            let time = self.due_time.unwrap_or(NaiveTime::MIN);
            return Some(date.and_time(time).and_utc());
        }
        self.due_time
            .map(|time| self.created_at.date_naive().and_time(time).and_utc())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Task,
    Break,
}

/// A scheduled interval in a generated day plan. Ephemeral: rebuilt on
/// every planning run, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeBlock {
    pub id: String,
    pub kind: BlockKind,
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TimeBlock {
    pub fn validate(&self) -> Result<(), String> {
        validate_non_empty(&self.id, "block.id")?;
        if self.end <= self.start {
            return Err("block.end must be after block.start".to_string());
        }
        Ok(())
    }
}

fn validate_non_empty(value: &str, field_name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field_name} must not be empty"));
    }
    Ok(())
}
