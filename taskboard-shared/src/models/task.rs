/// Task model and database operations
///
/// Tasks are the central entity of Taskboard. Each task has a priority, one
/// of nine workflow statuses, an optional category and assignee, and a set
/// of tasks it is blocked by.
///
/// # Status
///
/// Status is a flat enumeration. Any status can be set from any other; the
/// order of [`TaskStatus::ALL`] is the order of the kanban columns:
///
/// ```text
/// todo → in_progress → review → blocked → ready_test → testing → tested → ready_deploy → done
/// ```
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deadline TIMESTAMPTZ,
///     estimated_hours INTEGER CHECK (estimated_hours >= 0),
///     priority task_priority NOT NULL DEFAULT 'medium',
///     status task_status NOT NULL DEFAULT 'todo',
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
///     assigned_to UUID REFERENCES users(id) ON DELETE SET NULL
/// );
///
/// CREATE TABLE task_blockers (
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     blocker_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     PRIMARY KEY (task_id, blocker_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::models::task::{CreateTask, Task, TaskPriority, TaskStatus};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let task = Task::create(&pool, &CreateTask {
///     title: "Write release notes".to_string(),
///     priority: TaskPriority::High,
///     ..Default::default()
/// })
/// .await?;
///
/// assert_eq!(task.status, TaskStatus::Todo);
/// Task::update_status(&pool, task.id, TaskStatus::InProgress).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, PgConnection, PgExecutor, PgPool, Row};
use uuid::Uuid;

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Review,
    /// Waiting on the tasks it is blocked by
    Blocked,
    ReadyTest,
    Testing,
    Tested,
    ReadyDeploy,
    Done,
}

impl TaskStatus {
    /// Every status, in board order
    pub const ALL: [TaskStatus; 9] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::Review,
        TaskStatus::Blocked,
        TaskStatus::ReadyTest,
        TaskStatus::Testing,
        TaskStatus::Tested,
        TaskStatus::ReadyDeploy,
        TaskStatus::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Review => "review",
            TaskStatus::Blocked => "blocked",
            TaskStatus::ReadyTest => "ready_test",
            TaskStatus::Testing => "testing",
            TaskStatus::Tested => "tested",
            TaskStatus::ReadyDeploy => "ready_deploy",
            TaskStatus::Done => "done",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::Review => "Review",
            TaskStatus::Blocked => "Waiting on linked tasks",
            TaskStatus::ReadyTest => "Ready for testing",
            TaskStatus::Testing => "Testing",
            TaskStatus::Tested => "Tested",
            TaskStatus::ReadyDeploy => "Ready to deploy",
            TaskStatus::Done => "Done",
        }
    }

    /// Parses a status code, exact match only
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Board column of this status
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [TaskPriority::Low, TaskPriority::Medium, TaskPriority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskPriority::Low => "Low",
            TaskPriority::Medium => "Medium",
            TaskPriority::High => "High",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|priority| priority.as_str() == value)
    }
}

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    pub title: String,

    /// Free-form description, empty when not given
    pub description: String,

    /// Set by the database on insert, never updated
    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub deadline: Option<DateTime<Utc>>,

    pub estimated_hours: Option<i32>,

    pub priority: TaskPriority,

    pub status: TaskStatus,

    /// Nulled when the category is deleted
    pub category_id: Option<Uuid>,

    /// Nulled when the user is deleted
    pub assigned_to: Option<Uuid>,
}

impl Task {
    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Done
    }
}

/// Task joined with the display names of its category and assignee
///
/// Every list-shaped query returns this so a page of tasks costs one
/// round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskWithRelations {
    #[serde(flatten)]
    pub task: Task,

    pub category_name: Option<String>,

    pub assignee_username: Option<String>,

    pub is_completed: bool,
}

/// `is_completed` is derived from the status, never read from a column
impl<'r> FromRow<'r, PgRow> for TaskWithRelations {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let task = Task::from_row(row)?;

        Ok(Self {
            is_completed: task.is_completed(),
            category_name: row.try_get("category_name")?,
            assignee_username: row.try_get("assignee_username")?,
            task,
        })
    }
}

impl From<Task> for TaskWithRelations {
    fn from(task: Task) -> Self {
        Self {
            is_completed: task.is_completed(),
            task,
            category_name: None,
            assignee_username: None,
        }
    }
}

/// Minimal task reference used for blocker lists and form choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskSummary {
    pub id: Uuid,
    pub title: String,
    pub status: TaskStatus,
}

/// Input for creating a task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTask {
    pub title: String,
    pub description: String,
    pub deadline: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub category_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
}

/// Input for editing a task
///
/// Edits replace every editable field, like a submitted form does.
pub type UpdateTask = CreateTask;

/// Columns of `tasks t` in `Task` field order
pub(crate) const TASK_COLUMNS: &str = "t.id, t.title, t.description, t.created_at, t.updated_at, \
     t.deadline, t.estimated_hours, t.priority, t.status, t.category_id, t.assigned_to";

/// SELECT prefix producing `TaskWithRelations` rows
pub(crate) const SELECT_WITH_RELATIONS: &str = "SELECT t.id, t.title, t.description, t.created_at, \
     t.updated_at, t.deadline, t.estimated_hours, t.priority, t.status, t.category_id, \
     t.assigned_to, c.name AS category_name, u.username AS assignee_username \
     FROM tasks t \
     LEFT JOIN categories c ON c.id = t.category_id \
     LEFT JOIN users u ON u.id = t.assigned_to";

impl Task {
    /// Inserts a task; `id` and `created_at` come from the database
    pub async fn create<'e, E>(executor: E, data: &CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks AS t (title, description, deadline, estimated_hours,
                                    priority, status, category_id, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.deadline)
        .bind(data.estimated_hours)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.category_id)
        .bind(data.assigned_to)
        .fetch_one(executor)
        .await?;

        Ok(task)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks t WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    pub async fn exists<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = $1)")
            .bind(id)
            .fetch_one(executor)
            .await?;

        Ok(exists)
    }

    /// Finds a task together with its category and assignee names
    pub async fn find_with_relations(
        pool: &PgPool,
        id: Uuid,
    ) -> Result<Option<TaskWithRelations>, sqlx::Error> {
        let task = sqlx::query_as::<_, TaskWithRelations>(&format!(
            "{SELECT_WITH_RELATIONS} WHERE t.id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Replaces every editable field; `created_at` is left alone
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: &UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks AS t
            SET title = $2,
                description = $3,
                deadline = $4,
                estimated_hours = $5,
                priority = $6,
                status = $7,
                category_id = $8,
                assigned_to = $9,
                updated_at = NOW()
            WHERE t.id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&data.title)
        .bind(&data.description)
        .bind(data.deadline)
        .bind(data.estimated_hours)
        .bind(data.priority)
        .bind(data.status)
        .bind(data.category_id)
        .bind(data.assigned_to)
        .fetch_optional(executor)
        .await?;

        Ok(task)
    }

    /// Sets the status; last write wins
    ///
    /// Returns `None` when the task does not exist.
    pub async fn update_status(
        pool: &PgPool,
        id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let task = sqlx::query_as::<_, Task>(&format!(
            r#"
            UPDATE tasks AS t
            SET status = $2, updated_at = NOW()
            WHERE t.id = $1
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(pool)
        .await?;

        Ok(task)
    }

    /// Deletes a task
    ///
    /// Blocker edges mentioning the task go with it; the tasks on the other
    /// end of those edges are kept.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All tasks with relations, newest first
    pub async fn list_with_relations(pool: &PgPool) -> Result<Vec<TaskWithRelations>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithRelations>(&format!(
            "{SELECT_WITH_RELATIONS} ORDER BY t.created_at DESC, t.id DESC"
        ))
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Every task assigned to a user
    pub async fn list_assigned_to(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, Task>(&format!(
            r#"
            SELECT {TASK_COLUMNS}
            FROM tasks t
            WHERE t.assigned_to = $1
            ORDER BY t.created_at DESC, t.id DESC
            "#
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Most recently created tasks assigned to a user
    pub async fn recent_assigned_to(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<TaskWithRelations>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskWithRelations>(&format!(
            r#"
            {SELECT_WITH_RELATIONS}
            WHERE t.assigned_to = $1
            ORDER BY t.created_at DESC, t.id DESC
            LIMIT $2
            "#
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Id, title and status of every task, by title
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskSummary>(
            "SELECT id, title, status FROM tasks ORDER BY title, id",
        )
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Which of `ids` exist
    pub async fn existing_ids<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM tasks WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(executor)
            .await?;

        Ok(found)
    }

    /// Tasks this task is blocked by
    pub async fn list_blockers(pool: &PgPool, id: Uuid) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskSummary>(
            r#"
            SELECT t.id, t.title, t.status
            FROM task_blockers b
            JOIN tasks t ON t.id = b.blocker_id
            WHERE b.task_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Tasks blocked by this task
    pub async fn list_blocking(pool: &PgPool, id: Uuid) -> Result<Vec<TaskSummary>, sqlx::Error> {
        let tasks = sqlx::query_as::<_, TaskSummary>(
            r#"
            SELECT t.id, t.title, t.status
            FROM task_blockers b
            JOIN tasks t ON t.id = b.task_id
            WHERE b.blocker_id = $1
            ORDER BY t.created_at DESC, t.id DESC
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(tasks)
    }

    /// Every `(task_id, blocker_id)` edge
    pub async fn blocker_edges<'e, E>(executor: E) -> Result<Vec<(Uuid, Uuid)>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let edges = sqlx::query_as::<_, (Uuid, Uuid)>("SELECT task_id, blocker_id FROM task_blockers")
            .fetch_all(executor)
            .await?;

        Ok(edges)
    }

    /// Serializes blocker edits until the surrounding transaction ends
    ///
    /// Two edits that each pass the cycle check against the same snapshot
    /// could otherwise commit a cycle together. `SHARE ROW EXCLUSIVE`
    /// conflicts with itself and with row writes, but not with plain reads.
    pub async fn lock_blocker_graph(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
        sqlx::query("LOCK TABLE task_blockers IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *conn)
            .await?;

        Ok(())
    }

    /// Replaces the blocker set of a task
    ///
    /// Callers check the new edges with [`crate::dependency::ensure_acyclic`]
    /// first and run this inside the same transaction.
    pub async fn replace_blockers(
        conn: &mut PgConnection,
        id: Uuid,
        blocker_ids: &[Uuid],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM task_blockers WHERE task_id = $1")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        if !blocker_ids.is_empty() {
            sqlx::query(
                r#"
                INSERT INTO task_blockers (task_id, blocker_id)
                SELECT $1, blocker_id FROM UNNEST($2::uuid[]) AS blocker_id
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(id)
            .bind(blocker_ids)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_round_trip_through_parse() {
        for status in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::ALL.len(), 9);
    }

    #[test]
    fn test_status_parse_rejects_unknown_values() {
        assert_eq!(TaskStatus::parse("finished"), None);
        assert_eq!(TaskStatus::parse("DONE"), None);
        assert_eq!(TaskStatus::parse(" done"), None);
        assert_eq!(TaskStatus::parse(""), None);
    }

    #[test]
    fn test_status_index_matches_board_order() {
        for (i, status) in TaskStatus::ALL.iter().enumerate() {
            assert_eq!(status.index(), i);
        }
    }

    #[test]
    fn test_status_serde_uses_codes() {
        let json = serde_json::to_string(&TaskStatus::ReadyDeploy).unwrap();
        assert_eq!(json, "\"ready_deploy\"");

        let parsed: TaskStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(parsed, TaskStatus::InProgress);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);

        let data = CreateTask::default();
        assert_eq!(data.status, TaskStatus::Todo);
        assert_eq!(data.priority, TaskPriority::Medium);
        assert!(data.description.is_empty());
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!(TaskPriority::parse("high"), Some(TaskPriority::High));
        assert_eq!(TaskPriority::parse("urgent"), None);
    }

    #[test]
    fn test_is_completed_follows_status() {
        let now = Utc::now();
        let mut task = Task {
            id: Uuid::new_v4(),
            title: "Ship".to_string(),
            description: String::new(),
            created_at: now,
            updated_at: now,
            deadline: None,
            estimated_hours: None,
            priority: TaskPriority::Medium,
            status: TaskStatus::Tested,
            category_id: None,
            assigned_to: None,
        };
        assert!(!task.is_completed());

        task.status = TaskStatus::Done;
        assert!(task.is_completed());
        assert!(TaskWithRelations::from(task).is_completed);
    }

    #[test]
    fn test_with_relations_serializes_flat() {
        let now = Utc::now();
        let task = TaskWithRelations {
            task: Task {
                id: Uuid::nil(),
                title: "Flat".to_string(),
                description: String::new(),
                created_at: now,
                updated_at: now,
                deadline: None,
                estimated_hours: Some(3),
                priority: TaskPriority::Low,
                status: TaskStatus::Review,
                category_id: None,
                assigned_to: None,
            },
            category_name: Some("Ops".to_string()),
            assignee_username: None,
            is_completed: false,
        };

        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["title"], "Flat");
        assert_eq!(value["status"], "review");
        assert_eq!(value["category_name"], "Ops");
        assert!(value["assignee_username"].is_null());
    }
}
