pub mod calendar_view;
pub mod day_planner;
pub mod task_sync;
