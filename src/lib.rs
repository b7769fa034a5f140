//! Headless core of the FocusMate app family: day-plan generation and
//! Google Calendar reconciliation over a provider-agnostic calendar
//! interface. UI, OAuth, and speech capture live in the clients; this
//! crate only transforms data and talks to the calendar API.

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::calendar_view::{fetch_events_or_sample, merge_remote_events, sample_events};
pub use application::day_planner::{DayPlanner, ScheduleStats, apply_schedule, schedule_stats};
pub use application::task_sync::{SyncOutcome, TaskSyncService, apply_outcomes};
pub use domain::models::{BlockKind, Priority, Task, TimeBlock};
pub use infrastructure::error::CoreError;
pub use infrastructure::event_mapper::{
    GoogleCalendarEvent, build_event_description, decode_task_event, encode_task_event,
    mark_event_completed,
};
pub use infrastructure::google_calendar_client::{CalendarProvider, ReqwestCalendarProvider};
pub use infrastructure::task_repository::{
    InMemoryTaskRepository, SqliteTaskRepository, TaskRepository,
};
