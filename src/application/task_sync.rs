use crate::domain::models::Task;
use crate::infrastructure::error::CoreError;
use crate::infrastructure::event_mapper::{encode_task_event, mark_event_completed};
use crate::infrastructure::google_calendar_client::CalendarProvider;
use chrono_tz::Tz;
use std::sync::Arc;

/// Per-item result of a batch sync, in input order.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SyncOutcome {
    pub task_id: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub struct TaskSyncService<C>
where
    C: CalendarProvider,
{
    provider: Arc<C>,
    calendar_id: String,
    time_zone: Option<Tz>,
}

impl<C> TaskSyncService<C>
where
    C: CalendarProvider,
{
    pub fn new(provider: Arc<C>, calendar_id: impl Into<String>) -> Self {
        Self {
            provider,
            calendar_id: calendar_id.into(),
            time_zone: None,
        }
    }

    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = Some(time_zone);
        self
    }

    /// Creates a calendar event for the task, or no-ops idempotently
    /// when the task already carries a `calendar_event_id`. Recreating
    /// after a remote delete is the caller's decision.
    pub async fn sync_one(&self, access_token: &str, task: &Task) -> Result<String, CoreError> {
        task.validate().map_err(CoreError::Validation)?;

        if let Some(existing) = task
            .calendar_event_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
        {
            return Ok(existing.to_string());
        }

        let event = encode_task_event(task, self.time_zone);
        self.provider
            .create_event(access_token, &self.calendar_id, &event)
            .await
    }

    /// Syncs every incomplete task, strictly in sequence. Never fails
    /// as a whole: one item's error is captured in its outcome and the
    /// remaining items still run.
    pub async fn sync_batch(&self, access_token: &str, tasks: &[Task]) -> Vec<SyncOutcome> {
        let mut outcomes = Vec::new();

        for task in tasks.iter().filter(|task| !task.completed) {
            match self.sync_one(access_token, task).await {
                Ok(event_id) => outcomes.push(SyncOutcome {
                    task_id: task.id.clone(),
                    success: true,
                    event_id: Some(event_id),
                    error: None,
                }),
                Err(error) => {
                    tracing::warn!(task_id = %task.id, %error, "task sync failed");
                    outcomes.push(SyncOutcome {
                        task_id: task.id.clone(),
                        success: false,
                        event_id: None,
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        outcomes
    }

    /// Rewrites the remote event with the completion marker (title
    /// prefix and completed color); all other event fields keep their
    /// remote values.
    pub async fn mark_completed(
        &self,
        access_token: &str,
        event_id: &str,
        task: &Task,
    ) -> Result<(), CoreError> {
        let mut event = self
            .provider
            .get_event(access_token, &self.calendar_id, event_id)
            .await?;
        mark_event_completed(&mut event, task);
        self.provider
            .update_event(access_token, &self.calendar_id, event_id, &event)
            .await
    }
}

/// Copy-on-write application of batch outcomes: successful items get
/// their `calendar_event_id` stamped; everything else is unchanged.
pub fn apply_outcomes(tasks: &[Task], outcomes: &[SyncOutcome]) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            let matched = outcomes
                .iter()
                .find(|outcome| outcome.success && outcome.task_id == task.id)
                .and_then(|outcome| outcome.event_id.clone());
            match matched {
                Some(event_id) => {
                    let mut updated = task.clone();
                    updated.calendar_event_id = Some(event_id);
                    updated
                }
                None => task.clone(),
            }
        })
        .collect()
}
