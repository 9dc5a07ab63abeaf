/// `GET /kanban/`: every task in nine status columns, empty ones included

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use taskboard_shared::board::KanbanBoard;

pub async fn kanban_board(State(state): State<AppState>) -> ApiResult<Json<KanbanBoard>> {
    let board = KanbanBoard::load(&state.db).await?;
    tracing::debug!(tasks = board.total(), "Loaded kanban board");
    Ok(Json(board))
}
