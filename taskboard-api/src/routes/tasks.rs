/// Task endpoints
///
/// - `GET  /` - filtered, paginated list
/// - `GET  /task/:id/` - detail with blocker edges in both directions
/// - `GET|POST /task/create/`
/// - `GET|POST /task/:id/edit/`
/// - `GET|POST /task/:id/delete/` - confirmation, then deletion
/// - `POST /task/:id/update-status/` - urlencoded `status=<value>`
///
/// Create and edit run their reference checks, the write and the blocker
/// replacement in one transaction.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{
        check_task_references, AppJson, AppPath, Choice, FormDescriptor, StatusUpdateForm,
        TaskChoices, TaskForm,
    },
};
use axum::{
    extract::{rejection::FormRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::{
    models::{
        category::Category,
        task::{Task, TaskStatus, TaskSummary, TaskWithRelations},
        user::User,
    },
    query::{self, Page, PageRequest, TaskFilter, TaskFilterParams},
};
use uuid::Uuid;
use validator::Validate;

/// Filters as submitted, echoed back so a client can keep them while paging
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CurrentFilters {
    pub category: String,
    pub status: String,
    pub priority: String,
    pub date_filter: String,
}

impl From<&TaskFilterParams> for CurrentFilters {
    fn from(params: &TaskFilterParams) -> Self {
        let raw = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            category: raw(&params.category),
            status: raw(&params.status),
            priority: raw(&params.priority),
            date_filter: raw(&params.date_filter),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TaskListResponse {
    pub page: Page<TaskWithRelations>,
    pub filters: CurrentFilters,
    pub categories: Vec<Category>,
    pub statuses: Vec<Choice>,
    pub priorities: Vec<Choice>,
}

#[derive(Debug, Serialize)]
pub struct TaskDetailResponse {
    pub task: TaskWithRelations,

    /// Tasks this one waits on
    pub blocked_by: Vec<TaskSummary>,

    /// Tasks waiting on this one
    pub blocking: Vec<TaskSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Task list, ten per page, newest first
///
/// Query parameters: `category`, `status`, `priority`, `date_filter`
/// (`today`, `week`, `overdue`) and `page` (a number or `last`).
///
/// # Errors
///
/// - `404`: page is not a number or out of range
pub async fn list_tasks(
    State(state): State<AppState>,
    Query(params): Query<TaskFilterParams>,
) -> ApiResult<Json<TaskListResponse>> {
    let filter = TaskFilter::from_params(&params);
    let page_request = PageRequest::parse(params.page.as_deref());

    let page = query::list_tasks(&state.db, &filter, state.clock, state.now(), page_request).await?;
    let categories = Category::list(&state.db, None).await?;

    tracing::debug!(
        total = page.total_count,
        page = page.number,
        filtered = !filter.is_empty(),
        "Listed tasks"
    );

    Ok(Json(TaskListResponse {
        page,
        filters: CurrentFilters::from(&params),
        categories,
        statuses: Choice::statuses(),
        priorities: Choice::priorities(),
    }))
}

async fn load_detail(state: &AppState, id: Uuid) -> ApiResult<TaskDetailResponse> {
    let task = Task::find_with_relations(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(TaskDetailResponse {
        blocked_by: Task::list_blockers(&state.db, id).await?,
        blocking: Task::list_blocking(&state.db, id).await?,
        task,
    })
}

pub async fn task_detail(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<TaskDetailResponse>> {
    Ok(Json(load_detail(&state, id).await?))
}

async fn task_choices(state: &AppState) -> ApiResult<TaskChoices> {
    Ok(TaskChoices {
        categories: Category::list(&state.db, None).await?,
        users: User::list_summaries(&state.db).await?,
        tasks: Task::list_summaries(&state.db).await?,
    })
}

pub async fn create_form(State(state): State<AppState>) -> ApiResult<Json<FormDescriptor>> {
    let choices = task_choices(&state).await?;
    Ok(Json(FormDescriptor::task(&choices, None)))
}

/// Creates a task
///
/// # Errors
///
/// - `422`: invalid fields or references to missing rows
pub async fn create_task(
    State(state): State<AppState>,
    AppJson(form): AppJson<TaskForm>,
) -> ApiResult<(StatusCode, Json<TaskDetailResponse>)> {
    let form = form.trimmed();
    form.validate()?;
    let (data, blockers) = form.into_parts();

    let mut tx = state.db.begin().await?;
    check_task_references(&mut *tx, None, &data, &blockers).await?;
    let task = Task::create(&mut *tx, &data).await?;
    Task::replace_blockers(&mut *tx, task.id, &blockers).await?;
    tx.commit().await?;

    tracing::info!(task_id = %task.id, blockers = blockers.len(), "Task created");

    Ok((StatusCode::CREATED, Json(load_detail(&state, task.id).await?)))
}

pub async fn edit_form(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<FormDescriptor>> {
    let task = Task::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    let blockers: Vec<Uuid> = Task::list_blockers(&state.db, id)
        .await?
        .into_iter()
        .map(|blocker| blocker.id)
        .collect();

    let choices = task_choices(&state).await?;
    Ok(Json(FormDescriptor::task(&choices, Some((&task, &blockers)))))
}

/// Replaces every editable field and the blocker set
///
/// # Errors
///
/// - `404`: unknown task
/// - `422`: invalid fields, missing references, self-reference or a cycle
pub async fn update_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(form): AppJson<TaskForm>,
) -> ApiResult<Json<TaskDetailResponse>> {
    let mut tx = state.db.begin().await?;
    if !Task::exists(&mut *tx, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    let form = form.trimmed();
    form.validate()?;
    let (data, blockers) = form.into_parts();

    check_task_references(&mut *tx, Some(id), &data, &blockers).await?;
    Task::update(&mut *tx, id, &data)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;
    Task::replace_blockers(&mut *tx, id, &blockers).await?;
    tx.commit().await?;

    tracing::info!(task_id = %id, blockers = blockers.len(), "Task updated");

    Ok(Json(load_detail(&state, id).await?))
}

/// What deleting the task would affect
pub async fn delete_confirm(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<Json<TaskDetailResponse>> {
    Ok(Json(load_detail(&state, id).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !Task::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Task not found".to_string()));
    }

    tracing::info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Sets the status from a urlencoded `status` field
///
/// An unknown task is `404` whatever the body says; otherwise an unknown
/// or missing status is `400` with `{"success": false}`.
pub async fn update_status(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    form: Result<Form<StatusUpdateForm>, FormRejection>,
) -> ApiResult<Response> {
    let status = match form {
        Ok(Form(form)) => form.status.as_deref().and_then(TaskStatus::parse),
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Unreadable status update body");
            None
        }
    };

    let Some(status) = status else {
        if !Task::exists(&state.db, id).await? {
            return Err(ApiError::NotFound("Task not found".to_string()));
        }

        return Ok((
            StatusCode::BAD_REQUEST,
            Json(StatusUpdateResponse {
                success: false,
                error: Some("Invalid status".to_string()),
            }),
        )
            .into_response());
    };

    Task::update_status(&state.db, id, status)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tracing::info!(task_id = %id, status = status.as_str(), "Task status updated");

    Ok(Json(StatusUpdateResponse {
        success: true,
        error: None,
    })
    .into_response())
}
