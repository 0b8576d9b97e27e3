use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::error::AppError;
use crate::models::Tag;
use crate::services::catalog;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/tags/", get(list_tags))
        .route("/api/tags/{id}/", get(show_tag))
}

async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, AppError> {
    Ok(Json(catalog::list_tags(&state.db).await?))
}

async fn show_tag(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Tag>, AppError> {
    let tag = catalog::find_tag(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(tag))
}
