/// Category endpoints
///
/// - `GET  /categories/?q=` - list, optionally filtered by a name substring
/// - `POST /categories/` - create
/// - `POST /categories/:id/delete/` - delete; tasks in it become uncategorised

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    forms::{AppJson, AppPath, CategoryForm, FormDescriptor},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use taskboard_shared::models::category::Category;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
pub struct CategorySearch {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,

    /// Search term as submitted
    pub q: String,

    pub form: FormDescriptor,
}

pub async fn list_categories(
    State(state): State<AppState>,
    Query(search): Query<CategorySearch>,
) -> ApiResult<Json<CategoryListResponse>> {
    let q = search.q.unwrap_or_default();
    let term = Some(q.trim()).filter(|term| !term.is_empty());

    Ok(Json(CategoryListResponse {
        categories: Category::list(&state.db, term).await?,
        q,
        form: FormDescriptor::category(),
    }))
}

/// # Errors
///
/// - `422`: blank or overlong name
pub async fn create_category(
    State(state): State<AppState>,
    AppJson(form): AppJson<CategoryForm>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let form = form.trimmed();
    form.validate()?;

    let category = Category::create(&state.db, &form.name).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "Category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<StatusCode> {
    if !Category::delete(&state.db, id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id = %id, "Category deleted");
    Ok(StatusCode::NO_CONTENT)
}
