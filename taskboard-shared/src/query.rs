//! Task list filtering and pagination.
//!
//! Raw query parameters are parsed into a typed [`TaskFilter`], which is
//! turned into a single SQL query with the category and assignee joined in.
//! Results are ordered newest first and cut into pages of [`PAGE_SIZE`].
//!
//! # Example
//!
//! ```no_run
//! use taskboard_shared::calendar::LocalClock;
//! use taskboard_shared::query::{list_tasks, PageRequest, TaskFilter, TaskFilterParams};
//! use chrono::Utc;
//! use sqlx::PgPool;
//!
//! # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
//! let params = TaskFilterParams {
//!     status: Some("todo".to_string()),
//!     date_filter: Some("week".to_string()),
//!     ..Default::default()
//! };
//!
//! let filter = TaskFilter::from_params(&params);
//! let page = list_tasks(&pool, &filter, LocalClock::utc(), Utc::now(), PageRequest::parse(None)).await?;
//! println!("{} of {} tasks", page.items.len(), page.total_count);
//! # Ok(())
//! # }
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::LocalClock;
use crate::models::task::{TaskPriority, TaskStatus, TaskWithRelations, SELECT_WITH_RELATIONS};

/// Tasks per page
pub const PAGE_SIZE: u32 = 10;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Raw list parameters as they arrive in the query string
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilterParams {
    pub category: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub date_filter: Option<String>,
    pub page: Option<String>,
}

/// Deadline-based filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFilter {
    /// Deadline falls on today's date
    Today,
    /// Deadline falls between today and seven days from now, inclusive
    Week,
    /// Deadline has passed and the task is not done
    Overdue,
}

impl DateFilter {
    pub const ALL: [DateFilter; 3] = [DateFilter::Today, DateFilter::Week, DateFilter::Overdue];

    pub fn as_str(&self) -> &'static str {
        match self {
            DateFilter::Today => "today",
            DateFilter::Week => "week",
            DateFilter::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|filter| filter.as_str() == value)
    }

    /// Resolves the filter against the current instant
    pub fn condition(&self, clock: LocalClock, now: DateTime<Utc>) -> DateCondition {
        match self {
            DateFilter::Today => {
                let today = clock.today(now);
                DateCondition::DeadlineBetween {
                    start: clock.start_of(today),
                    end: clock.start_of(today + Duration::days(1)),
                }
            }
            DateFilter::Week => {
                let today = clock.today(now);
                DateCondition::DeadlineBetween {
                    start: clock.start_of(today),
                    end: clock.start_of(today + Duration::days(8)),
                }
            }
            DateFilter::Overdue => DateCondition::Overdue { now },
        }
    }
}

/// SQL-ready form of a [`DateFilter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateCondition {
    /// `start <= deadline < end`
    DeadlineBetween {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// `deadline < now` and not done
    Overdue { now: DateTime<Utc> },
}

/// Parsed task list filter; every present field must match
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub category_id: Option<Uuid>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub date_filter: Option<DateFilter>,

    /// Set when a category, status or priority value could not be parsed;
    /// such a filter matches nothing
    pub unmatchable: bool,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

impl TaskFilter {
    pub fn from_params(params: &TaskFilterParams) -> Self {
        let mut filter = TaskFilter::default();

        if let Some(raw) = present(&params.category) {
            match Uuid::parse_str(raw) {
                Ok(id) => filter.category_id = Some(id),
                Err(_) => filter.unmatchable = true,
            }
        }

        if let Some(raw) = present(&params.status) {
            match TaskStatus::parse(raw) {
                Some(status) => filter.status = Some(status),
                None => filter.unmatchable = true,
            }
        }

        if let Some(raw) = present(&params.priority) {
            match TaskPriority::parse(raw) {
                Some(priority) => filter.priority = Some(priority),
                None => filter.unmatchable = true,
            }
        }

        // Unknown date filters are ignored rather than matching nothing
        filter.date_filter = present(&params.date_filter).and_then(DateFilter::parse);

        filter
    }

    pub fn is_empty(&self) -> bool {
        *self == TaskFilter::default()
    }

    /// Appends ` WHERE ...` for this filter to a query over `tasks t`
    pub fn push_where(
        &self,
        builder: &mut QueryBuilder<'_, Postgres>,
        clock: LocalClock,
        now: DateTime<Utc>,
    ) {
        builder.push(" WHERE TRUE");

        if self.unmatchable {
            builder.push(" AND FALSE");
        }

        if let Some(category_id) = self.category_id {
            builder.push(" AND t.category_id = ");
            builder.push_bind(category_id);
        }

        if let Some(status) = self.status {
            builder.push(" AND t.status = ");
            builder.push_bind(status);
        }

        if let Some(priority) = self.priority {
            builder.push(" AND t.priority = ");
            builder.push_bind(priority);
        }

        match self.date_filter.map(|filter| filter.condition(clock, now)) {
            Some(DateCondition::DeadlineBetween { start, end }) => {
                builder.push(" AND t.deadline >= ");
                builder.push_bind(start);
                builder.push(" AND t.deadline < ");
                builder.push_bind(end);
            }
            Some(DateCondition::Overdue { now }) => {
                builder.push(" AND t.deadline < ");
                builder.push_bind(now);
                builder.push(" AND t.status <> ");
                builder.push_bind(TaskStatus::Done);
            }
            None => {}
        }
    }
}

/// Requested page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRequest {
    Number(u32),
    Last,
    /// Not a number and not `last`
    Invalid,
}

impl PageRequest {
    /// Parses the `page` parameter; absent or empty means page 1
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => PageRequest::Number(1),
            Some("last") => PageRequest::Last,
            Some(raw) => raw.parse().map(PageRequest::Number).unwrap_or(PageRequest::Invalid),
        }
    }

    /// Resolves to a 1-based page number within `1..=num_pages`
    pub fn resolve(&self, num_pages: u32) -> Result<u32, QueryError> {
        match *self {
            PageRequest::Last => Ok(num_pages),
            PageRequest::Number(n) if (1..=num_pages).contains(&n) => Ok(n),
            PageRequest::Number(n) => Err(QueryError::InvalidPage(format!(
                "Page {n} is out of range 1..={num_pages}"
            ))),
            PageRequest::Invalid => Err(QueryError::InvalidPage(
                "Page is not a number".to_string(),
            )),
        }
    }
}

/// Number of pages for `total` items; an empty list still has one page
pub fn num_pages(total: u64) -> u32 {
    let pages = total.div_ceil(u64::from(PAGE_SIZE)).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,

    /// 1-based page number
    pub number: u32,

    pub num_pages: u32,

    pub total_count: u64,

    pub page_size: u32,

    pub has_next: bool,

    pub has_previous: bool,
}

/// Runs the filter and returns the requested page, newest tasks first
///
/// # Errors
///
/// [`QueryError::InvalidPage`] when the page is not a number or is outside
/// `1..=num_pages`.
pub async fn list_tasks(
    pool: &PgPool,
    filter: &TaskFilter,
    clock: LocalClock,
    now: DateTime<Utc>,
    page: PageRequest,
) -> Result<Page<TaskWithRelations>, QueryError> {
    let mut count_query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
    filter.push_where(&mut count_query, clock, now);
    let total: i64 = count_query.build_query_scalar().fetch_one(pool).await?;
    let total = u64::try_from(total).unwrap_or(0);

    let num_pages = num_pages(total);
    let number = page.resolve(num_pages)?;
    let offset = i64::from(number - 1) * i64::from(PAGE_SIZE);

    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_WITH_RELATIONS);
    filter.push_where(&mut query, clock, now);
    query.push(" ORDER BY t.created_at DESC, t.id DESC LIMIT ");
    query.push_bind(i64::from(PAGE_SIZE));
    query.push(" OFFSET ");
    query.push_bind(offset);

    let items: Vec<TaskWithRelations> = query.build_query_as().fetch_all(pool).await?;

    Ok(Page {
        items,
        number,
        num_pages,
        total_count: total,
        page_size: PAGE_SIZE,
        has_next: number < num_pages,
        has_previous: number > 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn params(pairs: &[(&str, &str)]) -> TaskFilterParams {
        let mut params = TaskFilterParams::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "category" => params.category = value,
                "status" => params.status = value,
                "priority" => params.priority = value,
                "date_filter" => params.date_filter = value,
                "page" => params.page = value,
                other => panic!("unknown param {other}"),
            }
        }
        params
    }

    #[test]
    fn test_absent_and_empty_params_are_no_ops() {
        assert!(TaskFilter::from_params(&TaskFilterParams::default()).is_empty());
        assert!(TaskFilter::from_params(&params(&[
            ("category", ""),
            ("status", ""),
            ("priority", ""),
            ("date_filter", ""),
        ]))
        .is_empty());
    }

    #[test]
    fn test_valid_params_are_parsed() {
        let category = Uuid::new_v4();
        let filter = TaskFilter::from_params(&params(&[
            ("category", &category.to_string()),
            ("status", "in_progress"),
            ("priority", "high"),
            ("date_filter", "overdue"),
        ]));

        assert_eq!(filter.category_id, Some(category));
        assert_eq!(filter.status, Some(TaskStatus::InProgress));
        assert_eq!(filter.priority, Some(TaskPriority::High));
        assert_eq!(filter.date_filter, Some(DateFilter::Overdue));
        assert!(!filter.unmatchable);
    }

    #[test]
    fn test_unparseable_values_match_nothing() {
        assert!(TaskFilter::from_params(&params(&[("category", "abc")])).unmatchable);
        assert!(TaskFilter::from_params(&params(&[("status", "finished")])).unmatchable);
        assert!(TaskFilter::from_params(&params(&[("priority", "urgent")])).unmatchable);
    }

    #[test]
    fn test_unknown_date_filter_is_ignored() {
        let filter = TaskFilter::from_params(&params(&[("date_filter", "yesterday")]));
        assert!(filter.is_empty());
    }

    #[test]
    fn test_date_conditions() {
        let clock = LocalClock::utc();
        let now = at("2026-10-15T13:00:00Z");

        assert_eq!(
            DateFilter::Today.condition(clock, now),
            DateCondition::DeadlineBetween {
                start: at("2026-10-15T00:00:00Z"),
                end: at("2026-10-16T00:00:00Z"),
            }
        );
        // today through today + 7 days, inclusive
        assert_eq!(
            DateFilter::Week.condition(clock, now),
            DateCondition::DeadlineBetween {
                start: at("2026-10-15T00:00:00Z"),
                end: at("2026-10-23T00:00:00Z"),
            }
        );
        assert_eq!(
            DateFilter::Overdue.condition(clock, now),
            DateCondition::Overdue { now }
        );
    }

    #[test]
    fn test_date_conditions_use_local_calendar() {
        let clock = LocalClock::from_offset_minutes(120).unwrap();
        // already the 16th at UTC+2
        let now = at("2026-10-15T23:30:00Z");

        assert_eq!(
            DateFilter::Today.condition(clock, now),
            DateCondition::DeadlineBetween {
                start: at("2026-10-15T22:00:00Z"),
                end: at("2026-10-16T22:00:00Z"),
            }
        );
    }

    #[test]
    fn test_push_where_sql() {
        let clock = LocalClock::utc();
        let now = Utc::now();

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        TaskFilter::default().push_where(&mut builder, clock, now);
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM tasks t WHERE TRUE");

        let filter = TaskFilter {
            status: Some(TaskStatus::Todo),
            date_filter: Some(DateFilter::Overdue),
            ..Default::default()
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT COUNT(*) FROM tasks t");
        filter.push_where(&mut builder, clock, now);
        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM tasks t WHERE TRUE AND t.status = $1 \
             AND t.deadline < $2 AND t.status <> $3"
        );

        let filter = TaskFilter {
            unmatchable: true,
            ..Default::default()
        };
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM tasks t");
        filter.push_where(&mut builder, clock, now);
        assert_eq!(builder.sql(), "SELECT 1 FROM tasks t WHERE TRUE AND FALSE");
    }

    #[test]
    fn test_page_request_parse() {
        assert_eq!(PageRequest::parse(None), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("")), PageRequest::Number(1));
        assert_eq!(PageRequest::parse(Some("3")), PageRequest::Number(3));
        assert_eq!(PageRequest::parse(Some("last")), PageRequest::Last);
        assert_eq!(PageRequest::parse(Some("abc")), PageRequest::Invalid);
        assert_eq!(PageRequest::parse(Some("-1")), PageRequest::Invalid);
    }

    #[test]
    fn test_page_request_resolve() {
        assert_eq!(PageRequest::Number(1).resolve(1).unwrap(), 1);
        assert_eq!(PageRequest::Last.resolve(4).unwrap(), 4);
        assert_eq!(PageRequest::Number(4).resolve(4).unwrap(), 4);

        assert!(matches!(
            PageRequest::Number(0).resolve(4),
            Err(QueryError::InvalidPage(_))
        ));
        assert!(matches!(
            PageRequest::Number(5).resolve(4),
            Err(QueryError::InvalidPage(_))
        ));
        assert!(matches!(
            PageRequest::Invalid.resolve(4),
            Err(QueryError::InvalidPage(_))
        ));
    }

    #[test]
    fn test_num_pages() {
        assert_eq!(num_pages(0), 1);
        assert_eq!(num_pages(1), 1);
        assert_eq!(num_pages(10), 1);
        assert_eq!(num_pages(11), 2);
        assert_eq!(num_pages(25), 3);
    }
}
