//! Kanban projection: every task, bucketed by status.

use serde::Serialize;
use sqlx::PgPool;

use crate::models::task::{Task, TaskStatus, TaskWithRelations};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanColumn {
    pub status: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<TaskWithRelations>,
}

/// Nine columns in status order, each present even when empty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KanbanBoard {
    pub columns: Vec<KanbanColumn>,
}

impl KanbanBoard {
    /// Buckets `tasks` by status, preserving their relative order
    pub fn partition(tasks: Vec<TaskWithRelations>) -> Self {
        let mut columns: Vec<KanbanColumn> = TaskStatus::ALL
            .iter()
            .map(|status| KanbanColumn {
                status: *status,
                label: status.label(),
                tasks: Vec::new(),
            })
            .collect();

        for task in tasks {
            columns[task.task.status.index()].tasks.push(task);
        }

        Self { columns }
    }

    /// Loads every task, newest first, and partitions it
    pub async fn load(pool: &PgPool) -> Result<Self, sqlx::Error> {
        let tasks = Task::list_with_relations(pool).await?;
        Ok(Self::partition(tasks))
    }

    pub fn total(&self) -> usize {
        self.columns.iter().map(|column| column.tasks.len()).sum()
    }
}
