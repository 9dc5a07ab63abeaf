/// Request forms and their validation
///
/// Each POST body deserializes into a form struct validated with
/// `validator`. Checks that need the database (referenced rows exist,
/// blocker edges stay acyclic) run inside the caller's transaction.
///
/// The GET side of every form returns a [`FormDescriptor`]: the fields,
/// their widget hints, choices and initial values, so a client can render
/// the form without hard-coding it.

use axum::extract::{
    rejection::{JsonRejection, PathRejection},
    FromRequest, FromRequestParts,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgConnection;
use std::collections::HashSet;
use taskboard_shared::{
    dependency,
    models::{
        category::{Category, MAX_NAME_LENGTH},
        profile::MAX_BIO_LENGTH,
        task::{CreateTask, Task, TaskPriority, TaskStatus, TaskSummary},
        user::{User, UserSummary},
    },
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};

/// JSON body extractor whose rejections use the API error format
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::invalid_field("body", err.body_text()),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

/// Path extractor; a malformed id is reported as a missing resource
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct AppPath<T>(pub T);

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected path parameters");
        ApiError::NotFound("Not found".to_string())
    }
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("This field is required.".into());
        return Err(err);
    }
    Ok(())
}

/// Non-blank; letters, digits and `@.+-_` only
fn valid_username(value: &str) -> Result<(), ValidationError> {
    not_blank(value)?;

    if value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Ok(());
    }

    let mut err = ValidationError::new("username_chars");
    err.message = Some(
        "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
            .into(),
    );
    Err(err)
}

/// Create/edit task body
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TaskForm {
    #[validate(
        custom(function = "not_blank"),
        length(max = 200, message = "Ensure this value has at most 200 characters.")
    )]
    pub title: String,

    #[serde(default)]
    pub description: String,

    pub deadline: Option<DateTime<Utc>>,

    #[validate(range(min = 0, message = "Ensure this value is greater than or equal to 0."))]
    pub estimated_hours: Option<i32>,

    #[serde(default)]
    pub priority: TaskPriority,

    #[serde(default)]
    pub status: TaskStatus,

    pub category_id: Option<Uuid>,

    pub assigned_to: Option<Uuid>,

    /// Tasks this task waits on
    #[serde(default)]
    pub blocked_by: Vec<Uuid>,
}

impl TaskForm {
    /// Strips surrounding whitespace from the title so length limits see
    /// the stored value
    pub fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self
    }

    /// Row data and the de-duplicated blocker set
    pub fn into_parts(self) -> (CreateTask, Vec<Uuid>) {
        let mut seen = HashSet::new();
        let blockers = self
            .blocked_by
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();

        let data = CreateTask {
            title: self.title.trim().to_string(),
            description: self.description,
            deadline: self.deadline,
            estimated_hours: self.estimated_hours,
            priority: self.priority,
            status: self.status,
            category_id: self.category_id,
            assigned_to: self.assigned_to,
        };

        (data, blockers)
    }
}

/// Checks that the category, assignee and blockers of a task exist and,
/// for an existing task, that the blocker set keeps the graph acyclic
///
/// All reference problems are reported together. A task that is not
/// inserted yet has no incoming edges, so it cannot close a cycle. For an
/// existing task the blocker table stays locked until `conn`'s transaction
/// ends, so the caller must write the new edges in that transaction.
pub async fn check_task_references(
    conn: &mut PgConnection,
    task_id: Option<Uuid>,
    data: &CreateTask,
    blockers: &[Uuid],
) -> ApiResult<()> {
    let mut errors = Vec::new();

    if let Some(category_id) = data.category_id {
        if !Category::exists(&mut *conn, category_id).await? {
            errors.push(ValidationErrorDetail {
                field: "category_id".to_string(),
                message: "Select a valid choice. That choice is not one of the available choices."
                    .to_string(),
            });
        }
    }

    if let Some(user_id) = data.assigned_to {
        if !User::exists(&mut *conn, user_id).await? {
            errors.push(ValidationErrorDetail {
                field: "assigned_to".to_string(),
                message: "Select a valid choice. That choice is not one of the available choices."
                    .to_string(),
            });
        }
    }

    if !blockers.is_empty() {
        let found: HashSet<Uuid> = Task::existing_ids(&mut *conn, blockers)
            .await?
            .into_iter()
            .collect();
        for missing in blockers.iter().filter(|id| !found.contains(id)) {
            errors.push(ValidationErrorDetail {
                field: "blocked_by".to_string(),
                message: format!(
                    "Select a valid choice. {missing} is not one of the available choices."
                ),
            });
        }
    }

    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    if let Some(task_id) = task_id {
        Task::lock_blocker_graph(&mut *conn).await?;
        let edges = Task::blocker_edges(&mut *conn).await?;
        dependency::ensure_acyclic(&edges, task_id, blockers)?;
    }

    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[validate(
        custom(function = "valid_username"),
        length(max = 150, message = "Ensure this value has at most 150 characters.")
    )]
    pub username: String,

    #[validate(custom(function = "not_blank"))]
    pub password1: String,

    #[validate(custom(function = "not_blank"))]
    pub password2: String,
}

impl RegisterForm {
    /// Rejects mismatched confirmation
    pub fn check_passwords_match(&self) -> ApiResult<()> {
        if self.password1 != self.password2 {
            return Err(ApiError::invalid_field(
                "password2",
                "The two password fields didn't match.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginForm {
    #[validate(custom(function = "not_blank"))]
    pub username: String,

    #[validate(custom(function = "not_blank"))]
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileForm {
    #[serde(default)]
    #[validate(length(max = 5000, message = "Ensure this value has at most 5000 characters."))]
    pub bio: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CategoryForm {
    #[validate(
        custom(function = "not_blank"),
        length(max = 100, message = "Ensure this value has at most 100 characters.")
    )]
    pub name: String,
}

impl CategoryForm {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
        }
    }
}

/// Urlencoded body of the status endpoint
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateForm {
    pub status: Option<String>,
}

/// How a field should be rendered
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    Text,
    Password,
    Textarea { rows: u32 },
    DateTimeLocal,
    Number { min: i64 },
    Select,
    SelectMultiple,
}

impl Widget {
    /// CSS class hint for the input element
    pub fn css_class(&self) -> &'static str {
        match self {
            Widget::Select | Widget::SelectMultiple => "form-select",
            _ => "form-control",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub value: String,
    pub label: String,
}

impl Choice {
    fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }

    pub fn statuses() -> Vec<Self> {
        TaskStatus::ALL
            .iter()
            .map(|s| Choice::new(s.as_str(), s.label()))
            .collect()
    }

    pub fn priorities() -> Vec<Self> {
        TaskPriority::ALL
            .iter()
            .map(|p| Choice::new(p.as_str(), p.label()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub label: &'static str,
    pub widget: Widget,
    pub css_class: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
    pub initial: Value,
}

impl FieldDescriptor {
    fn new(name: &'static str, label: &'static str, widget: Widget) -> Self {
        Self {
            name,
            label,
            css_class: widget.css_class(),
            widget,
            required: false,
            max_length: None,
            choices: Vec::new(),
            initial: Value::Null,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    fn choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    fn initial(mut self, value: impl Serialize) -> Self {
        self.initial = serde_json::to_value(value).unwrap_or(Value::Null);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormDescriptor {
    pub fields: Vec<FieldDescriptor>,
}

/// Rows the task form offers as choices
#[derive(Debug, Clone, Default)]
pub struct TaskChoices {
    pub categories: Vec<Category>,
    pub users: Vec<UserSummary>,
    pub tasks: Vec<TaskSummary>,
}

impl FormDescriptor {
    /// Task form; `existing` supplies initial values when editing
    ///
    /// A task is never offered as its own blocker.
    pub fn task(choices: &TaskChoices, existing: Option<(&Task, &[Uuid])>) -> Self {
        let task = existing.map(|(task, _)| task);
        let blockers = existing.map(|(_, blockers)| blockers.to_vec()).unwrap_or_default();

        let category_choices = choices
            .categories
            .iter()
            .map(|c| Choice::new(c.id, c.name.clone()))
            .collect();
        let user_choices = choices
            .users
            .iter()
            .map(|u| Choice::new(u.id, u.username.clone()))
            .collect();
        let blocker_choices = choices
            .tasks
            .iter()
            .filter(|t| Some(t.id) != task.map(|t| t.id))
            .map(|t| Choice::new(t.id, t.title.clone()))
            .collect();
        let priority_choices = Choice::priorities();
        let status_choices = Choice::statuses();

        Self {
            fields: vec![
                FieldDescriptor::new("title", "Title", Widget::Text)
                    .required()
                    .max_length(200)
                    .initial(task.map(|t| t.title.clone())),
                FieldDescriptor::new("description", "Description", Widget::Textarea { rows: 4 })
                    .initial(task.map(|t| t.description.clone()).unwrap_or_default()),
                FieldDescriptor::new("deadline", "Deadline", Widget::DateTimeLocal)
                    .initial(task.and_then(|t| t.deadline)),
                FieldDescriptor::new("estimated_hours", "Estimated hours", Widget::Number { min: 0 })
                    .initial(task.and_then(|t| t.estimated_hours)),
                FieldDescriptor::new("priority", "Priority", Widget::Select)
                    .required()
                    .choices(priority_choices)
                    .initial(task.map(|t| t.priority).unwrap_or_default()),
                FieldDescriptor::new("status", "Status", Widget::Select)
                    .required()
                    .choices(status_choices)
                    .initial(task.map(|t| t.status).unwrap_or_default()),
                FieldDescriptor::new("category_id", "Category", Widget::Select)
                    .choices(category_choices)
                    .initial(task.and_then(|t| t.category_id)),
                FieldDescriptor::new("assigned_to", "Assigned to", Widget::Select)
                    .choices(user_choices)
                    .initial(task.and_then(|t| t.assigned_to)),
                FieldDescriptor::new("blocked_by", "Blocked by", Widget::SelectMultiple)
                    .choices(blocker_choices)
                    .initial(blockers),
            ],
        }
    }

    pub fn register() -> Self {
        Self {
            fields: vec![
                FieldDescriptor::new("username", "Username", Widget::Text)
                    .required()
                    .max_length(150),
                FieldDescriptor::new("password1", "Password", Widget::Password).required(),
                FieldDescriptor::new("password2", "Password confirmation", Widget::Password)
                    .required(),
            ],
        }
    }

    pub fn login() -> Self {
        Self {
            fields: vec![
                FieldDescriptor::new("username", "Username", Widget::Text).required(),
                FieldDescriptor::new("password", "Password", Widget::Password).required(),
            ],
        }
    }

    pub fn profile(bio: &str) -> Self {
        Self {
            fields: vec![FieldDescriptor::new("bio", "Bio", Widget::Textarea { rows: 4 })
                .max_length(MAX_BIO_LENGTH)
                .initial(bio)],
        }
    }

    pub fn category() -> Self {
        Self {
            fields: vec![FieldDescriptor::new("name", "Name", Widget::Text)
                .required()
                .max_length(MAX_NAME_LENGTH)],
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}
