use crate::domain::models::{BlockKind, Task, TimeBlock};
use crate::infrastructure::error::CoreError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use std::sync::Arc;

type NowProvider = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

const BREAK_EVERY_N_TASKS: usize = 2;
const BREAK_MINUTES: i64 = 10;
const BREAK_LABEL: &str = "Take a break 🧘";

/// Progress readout for a generated plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ScheduleStats {
    pub total_tasks: usize,
    pub scheduled_tasks: usize,
    pub percentage: u32,
}

pub struct DayPlanner {
    now_provider: NowProvider,
}

impl Default for DayPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DayPlanner {
    pub fn new() -> Self {
        Self {
            now_provider: Arc::new(Utc::now),
        }
    }

    pub fn with_now_provider(mut self, now_provider: NowProvider) -> Self {
        self.now_provider = now_provider;
        self
    }

    /// Generates an ordered day plan for `reference_date` within the
    /// `[work_start, work_end)` window.
    ///
    /// Incomplete tasks are stable-sorted by urgency score
    /// (days-until-due plus priority weight; overdue tasks score
    /// negative and land first). Tasks without any due timestamp sort
    /// last — lowest urgency by policy, not by arithmetic. A 10-minute
    /// break precedes every second task. A task whose block would end
    /// past `work_end` is dropped from the plan; the cursor does not
    /// move for dropped tasks.
    pub fn generate(
        &self,
        tasks: &[Task],
        work_start: NaiveTime,
        work_end: NaiveTime,
        reference_date: NaiveDate,
    ) -> Result<Vec<TimeBlock>, CoreError> {
        if work_start >= work_end {
            return Err(CoreError::Validation(
                "work_start must be before work_end".to_string(),
            ));
        }

        let now = (self.now_provider)();
        let mut pending: Vec<&Task> = tasks.iter().filter(|task| !task.completed).collect();
        pending.sort_by_key(|task| match urgency_score(task, now) {
            Some(score) => (false, score),
            None => (true, 0),
        });

        let mut cursor = reference_date.and_time(work_start).and_utc();
        let window_end = reference_date.and_time(work_end).and_utc();
        let mut blocks = Vec::new();

        for (index, task) in pending.iter().enumerate() {
            if index > 0 && index % BREAK_EVERY_N_TASKS == 0 {
                let break_end = cursor + Duration::minutes(BREAK_MINUTES);
                blocks.push(TimeBlock {
                    id: format!("break-{index}"),
                    kind: BlockKind::Break,
                    label: BREAK_LABEL.to_string(),
                    start: cursor,
                    end: break_end,
                    task_id: None,
                    priority: None,
                });
                cursor = break_end;
            }

            let candidate_end = cursor + Duration::minutes(task.effective_estimate() as i64);
            if candidate_end > window_end {
                continue;
            }

            blocks.push(TimeBlock {
                id: task.id.clone(),
                kind: BlockKind::Task,
                label: task.action.clone(),
                start: cursor,
                end: candidate_end,
                task_id: Some(task.id.clone()),
                priority: Some(task.priority),
            });
            cursor = candidate_end;
        }

        Ok(blocks)
    }
}

/// Signed days until due plus priority weight; `None` when the task
/// carries no due timestamp at all.
fn urgency_score(task: &Task, now: DateTime<Utc>) -> Option<i64> {
    task.due_instant()
        .map(|due| (due - now).num_days() + task.priority.weight())
}

/// Copy-on-write application of a generated plan: returns new task
/// values with `scheduled_start`/`scheduled_end` stamped from their
/// blocks. Tasks absent from the plan are returned unchanged.
pub fn apply_schedule(tasks: &[Task], blocks: &[TimeBlock]) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            let scheduled = blocks.iter().find(|block| {
                block.kind == BlockKind::Task && block.task_id.as_deref() == Some(task.id.as_str())
            });
            match scheduled {
                Some(block) => {
                    let mut updated = task.clone();
                    updated.scheduled_start = Some(block.start);
                    updated.scheduled_end = Some(block.end);
                    updated
                }
                None => task.clone(),
            }
        })
        .collect()
}

pub fn schedule_stats(tasks: &[Task], blocks: &[TimeBlock]) -> ScheduleStats {
    let total_tasks = tasks.iter().filter(|task| !task.completed).count();
    let scheduled_tasks = blocks
        .iter()
        .filter(|block| block.kind == BlockKind::Task)
        .count();
    let percentage = if total_tasks > 0 {
        ((scheduled_tasks as f64 / total_tasks as f64) * 100.0).round() as u32
    } else {
        0
    };
    ScheduleStats {
        total_tasks,
        scheduled_tasks,
        percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::Priority;
    use proptest::prelude::*;

    fn fixed_time(value: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(value)
            .expect("valid datetime")
            .with_timezone(&Utc)
    }

    fn fixed_now() -> DateTime<Utc> {
        fixed_time("2025-11-10T08:00:00Z")
    }

    fn planner() -> DayPlanner {
        DayPlanner::new().with_now_provider(Arc::new(fixed_now))
    }

    fn hhmm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn reference_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, 10).expect("valid date")
    }

    fn task(id: &str, priority: Priority, due_offset_days: i64, estimate: Option<u32>) -> Task {
        Task {
            id: id.to_string(),
            created_at: fixed_time("2025-11-09T12:00:00Z"),
            action: format!("Task {id}"),
            due_date: None,
            due_time: None,
            due_datetime: Some(fixed_now() + Duration::days(due_offset_days)),
            estimated_minutes: estimate,
            calendar_event_id: None,
            scheduled_start: None,
            scheduled_end: None,
            priority,
            completed: false,
            confidence: 1.0,
            transcript: None,
            rationale: None,
            source: None,
        }
    }

    #[test]
    fn empty_task_list_produces_empty_plan() {
        let blocks = planner()
            .generate(&[], hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");
        assert!(blocks.is_empty());
    }

    #[test]
    fn rejects_inverted_work_window() {
        let result = planner().generate(&[], hhmm(18, 0), hhmm(9, 0), reference_date());
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[test]
    fn completed_tasks_are_excluded() {
        let mut done = task("done", Priority::High, 0, Some(30));
        done.completed = true;
        let blocks = planner()
            .generate(&[done], hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");
        assert!(blocks.is_empty());
    }

    #[test]
    fn overdue_tasks_float_to_the_top() {
        // medium overdue by 15 days: -15 + 10 = -5, beats high due now (0)
        let tasks = vec![
            task("high-today", Priority::High, 0, Some(30)),
            task("low-today", Priority::Low, 0, Some(30)),
            task("overdue-medium", Priority::Medium, -15, Some(30)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");
        let order: Vec<&str> = blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Task)
            .filter_map(|b| b.task_id.as_deref())
            .collect();
        assert_eq!(order, vec!["overdue-medium", "high-today", "low-today"]);
    }

    #[test]
    fn tasks_without_due_timestamp_sort_last() {
        let mut undated = task("undated-high", Priority::High, 0, Some(30));
        undated.due_datetime = None;
        let tasks = vec![undated, task("low-today", Priority::Low, 0, Some(30))];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");
        let order: Vec<&str> = blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Task)
            .filter_map(|b| b.task_id.as_deref())
            .collect();
        assert_eq!(order, vec!["low-today", "undated-high"]);
    }

    #[test]
    fn break_inserted_before_every_second_task() {
        let tasks = vec![
            task("a", Priority::High, 0, Some(30)),
            task("b", Priority::High, 1, Some(30)),
            task("c", Priority::High, 2, Some(30)),
            task("d", Priority::High, 3, Some(30)),
            task("e", Priority::High, 4, Some(30)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");

        let kinds: Vec<BlockKind> = blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Task,
                BlockKind::Task,
                BlockKind::Break,
                BlockKind::Task,
                BlockKind::Task,
                BlockKind::Break,
                BlockKind::Task,
            ]
        );
        for block in blocks.iter().filter(|b| b.kind == BlockKind::Break) {
            assert_eq!(block.end - block.start, Duration::minutes(10));
        }
        // contiguous walk: each block starts where the previous ended
        for pair in blocks.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn task_overflowing_window_is_dropped_and_cursor_unchanged() {
        let tasks = vec![
            task("fits", Priority::High, 0, Some(30)),
            task("too-long", Priority::Low, 0, Some(45)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(9, 50), reference_date())
            .expect("generate");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].task_id.as_deref(), Some("fits"));
        assert_eq!(blocks[0].start, fixed_time("2025-11-10T09:00:00Z"));
        assert_eq!(blocks[0].end, fixed_time("2025-11-10T09:30:00Z"));
    }

    #[test]
    fn dropped_task_does_not_block_later_shorter_task() {
        let tasks = vec![
            task("first", Priority::High, 0, Some(30)),
            task("dropped", Priority::Medium, 0, Some(120)),
            task("short", Priority::Low, 0, Some(10)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(10, 0), reference_date())
            .expect("generate");
        let scheduled: Vec<&str> = blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Task)
            .filter_map(|b| b.task_id.as_deref())
            .collect();
        assert_eq!(scheduled, vec!["first", "short"]);
        // break-2 still precedes the third processed task
        assert_eq!(blocks[1].kind, BlockKind::Break);
        assert_eq!(blocks[1].start, fixed_time("2025-11-10T09:30:00Z"));
        assert_eq!(blocks[2].start, fixed_time("2025-11-10T09:40:00Z"));
    }

    #[test]
    fn zero_estimate_clamps_to_thirty_minutes() {
        let tasks = vec![task("zero", Priority::High, 0, Some(0))];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(18, 0), reference_date())
            .expect("generate");
        assert_eq!(blocks[0].end - blocks[0].start, Duration::minutes(30));
    }

    #[test]
    fn apply_schedule_stamps_only_planned_tasks() {
        let tasks = vec![
            task("planned", Priority::High, 0, Some(30)),
            task("unplanned", Priority::Low, 0, Some(600)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(10, 0), reference_date())
            .expect("generate");
        let updated = apply_schedule(&tasks, &blocks);

        assert_eq!(
            updated[0].scheduled_start,
            Some(fixed_time("2025-11-10T09:00:00Z"))
        );
        assert_eq!(
            updated[0].scheduled_end,
            Some(fixed_time("2025-11-10T09:30:00Z"))
        );
        assert_eq!(updated[1].scheduled_start, None);
        // copy-on-write: the inputs are untouched
        assert_eq!(tasks[0].scheduled_start, None);
    }

    #[test]
    fn schedule_stats_counts_task_blocks() {
        let tasks = vec![
            task("a", Priority::High, 0, Some(30)),
            task("b", Priority::Low, 0, Some(600)),
        ];
        let blocks = planner()
            .generate(&tasks, hhmm(9, 0), hhmm(10, 0), reference_date())
            .expect("generate");
        let stats = schedule_stats(&tasks, &blocks);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.scheduled_tasks, 1);
        assert_eq!(stats.percentage, 50);
    }

    fn priority_strategy() -> impl Strategy<Value = Priority> {
        prop_oneof![
            Just(Priority::High),
            Just(Priority::Medium),
            Just(Priority::Low)
        ]
    }

    proptest! {
        #[test]
        fn plan_blocks_are_ordered_and_task_blocks_fit_window(
            specs in prop::collection::vec(
                (priority_strategy(), -5i64..10i64, 1u32..180u32, any::<bool>()),
                0..12
            )
        ) {
            let tasks: Vec<Task> = specs
                .iter()
                .enumerate()
                .map(|(i, (priority, offset, estimate, completed))| {
                    let mut t = task(&format!("tsk-{i}"), *priority, *offset, Some(*estimate));
                    t.completed = *completed;
                    t
                })
                .collect();

            let blocks = planner()
                .generate(&tasks, hhmm(9, 0), hhmm(18, 0), reference_date())
                .expect("generate");

            let window_end = reference_date().and_time(hhmm(18, 0)).and_utc();
            for pair in blocks.windows(2) {
                prop_assert!(pair[0].start <= pair[1].start);
                prop_assert!(pair[0].end <= pair[1].start);
            }
            for block in &blocks {
                prop_assert!(block.start < block.end);
                if block.kind == BlockKind::Task {
                    prop_assert!(block.end <= window_end);
                }
            }

            let incomplete = tasks.iter().filter(|t| !t.completed).count();
            let scheduled = blocks.iter().filter(|b| b.kind == BlockKind::Task).count();
            prop_assert!(scheduled <= incomplete);
        }
    }
}
