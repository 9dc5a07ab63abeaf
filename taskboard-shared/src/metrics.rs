//! Per-user productivity metrics.
//!
//! Counts are taken over the tasks assigned to a user whose `created_at`
//! falls on or after the start of each window: today, this week (from
//! Monday) and this month, all in the configured display offset, plus an
//! all-time snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::calendar::LocalClock;
use crate::models::task::{Task, TaskStatus};

/// Aggregates over one time window
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Tasks with status `done`
    pub completed: u64,

    pub total: u64,

    pub in_progress: u64,

    /// Sum of `estimated_hours` over completed tasks
    pub hours: i64,

    /// Percentage of completed tasks, 0 when there are none
    pub completion_rate: u8,
}

impl MetricsSnapshot {
    /// Aggregates `tasks` created at or after `since`
    pub fn collect<'a>(tasks: impl IntoIterator<Item = &'a Task>, since: Option<DateTime<Utc>>) -> Self {
        let mut snapshot = Self::default();

        for task in tasks {
            if since.is_some_and(|start| task.created_at < start) {
                continue;
            }

            snapshot.total += 1;
            match task.status {
                TaskStatus::Done => {
                    snapshot.completed += 1;
                    snapshot.hours += i64::from(task.estimated_hours.unwrap_or(0));
                }
                TaskStatus::InProgress => snapshot.in_progress += 1,
                _ => {}
            }
        }

        snapshot.completion_rate = completion_rate(snapshot.completed, snapshot.total);
        snapshot
    }
}

/// `completed * 100 / total`, rounded half to even
pub fn completion_rate(completed: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }

    let scaled = completed.min(total) * 100;
    let quotient = scaled / total;
    let remainder = scaled % total;

    let rounded = match (remainder * 2).cmp(&total) {
        std::cmp::Ordering::Less => quotient,
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient % 2),
    };

    rounded.min(100) as u8
}

/// Metrics for every window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileMetrics {
    pub today: MetricsSnapshot,
    pub week: MetricsSnapshot,
    pub month: MetricsSnapshot,
    pub all_time: MetricsSnapshot,
}

impl ProfileMetrics {
    pub fn compute(tasks: &[Task], clock: LocalClock, now: DateTime<Utc>) -> Self {
        Self {
            today: MetricsSnapshot::collect(tasks, Some(clock.day_start(now))),
            week: MetricsSnapshot::collect(tasks, Some(clock.week_start(now))),
            month: MetricsSnapshot::collect(tasks, Some(clock.month_start(now))),
            all_time: MetricsSnapshot::collect(tasks, None),
        }
    }

    /// Loads the user's assigned tasks and aggregates them
    pub async fn load(
        pool: &PgPool,
        user_id: Uuid,
        clock: LocalClock,
        now: DateTime<Utc>,
    ) -> Result<Self, sqlx::Error> {
        let tasks = Task::list_assigned_to(pool, user_id).await?;
        Ok(Self::compute(&tasks, clock, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::task::TaskPriority;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn task(created_at: DateTime<Utc>, status: TaskStatus, hours: Option<i32>) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "t".to_string(),
            description: String::new(),
            created_at,
            updated_at: created_at,
            deadline: None,
            estimated_hours: hours,
            priority: TaskPriority::Medium,
            status,
            category_id: None,
            assigned_to: None,
        }
    }

    #[test]
    fn test_completion_rate_rounds_half_to_even() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 2), 50);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(1, 8), 12);
        assert_eq!(completion_rate(3, 8), 38);
        assert_eq!(completion_rate(5, 8), 62);
        assert_eq!(completion_rate(4, 4), 100);
        assert_eq!(completion_rate(0, 7), 0);
    }

    #[test]
    fn test_completion_rate_is_bounded() {
        for total in 1..=40 {
            for completed in 0..=total {
                assert!(completion_rate(completed, total) <= 100);
            }
        }
        assert_eq!(completion_rate(9, 3), 100);
    }

    #[test]
    fn test_week_with_one_done_and_one_in_progress() {
        let clock = LocalClock::utc();
        // Thursday
        let now = at("2026-10-15T12:00:00Z");
        let tasks = vec![
            task(at("2026-10-13T09:00:00Z"), TaskStatus::Done, Some(5)),
            task(at("2026-10-14T09:00:00Z"), TaskStatus::InProgress, Some(3)),
        ];

        let metrics = ProfileMetrics::compute(&tasks, clock, now);
        assert_eq!(
            metrics.week,
            MetricsSnapshot {
                completed: 1,
                total: 2,
                in_progress: 1,
                hours: 5,
                completion_rate: 50,
            }
        );
        assert_eq!(metrics.today, MetricsSnapshot::default());
        assert_eq!(metrics.month, metrics.week);
        assert_eq!(metrics.all_time, metrics.week);
    }

    #[test]
    fn test_windows_nest() {
        let clock = LocalClock::utc();
        let now = at("2026-10-15T12:00:00Z");
        let tasks = vec![
            task(now - Duration::hours(1), TaskStatus::Done, None),
            task(at("2026-10-12T00:00:00Z"), TaskStatus::Todo, Some(2)),
            task(at("2026-10-01T00:00:00Z"), TaskStatus::Done, Some(4)),
            task(at("2026-09-30T23:59:59Z"), TaskStatus::Done, Some(8)),
        ];

        let metrics = ProfileMetrics::compute(&tasks, clock, now);
        assert_eq!(metrics.today.total, 1);
        assert_eq!(metrics.today.hours, 0);
        assert_eq!(metrics.today.completion_rate, 100);
        assert_eq!(metrics.week.total, 2);
        assert_eq!(metrics.month.total, 3);
        assert_eq!(metrics.month.hours, 4);
        assert_eq!(metrics.all_time.total, 4);
        assert_eq!(metrics.all_time.hours, 12);
        assert_eq!(metrics.all_time.completion_rate, 75);
    }

    #[test]
    fn test_no_tasks() {
        let metrics = ProfileMetrics::compute(&[], LocalClock::utc(), Utc::now());
        assert_eq!(metrics.all_time, MetricsSnapshot::default());
    }
}
