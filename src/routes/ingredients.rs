use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::error::AppError;
use crate::models::Ingredient;
use crate::services::catalog;
use crate::AppState;

#[derive(Deserialize)]
pub struct IngredientSearch {
    name: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/ingredients/", get(list_ingredients))
        .route("/api/ingredients/{id}/", get(show_ingredient))
}

async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> Result<Json<Vec<Ingredient>>, AppError> {
    Ok(Json(catalog::search_ingredients(&state.db, search.name.as_deref()).await?))
}

async fn show_ingredient(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Ingredient>, AppError> {
    let ingredient = catalog::find_ingredient(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(ingredient))
}
