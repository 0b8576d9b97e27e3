use axum::{
    extract::{rejection::JsonRejection, Path, Query, RawQuery, State},
    http::{header, HeaderMap, HeaderValue, StatusCode, Uri},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::auth::{AuthUser, MaybeUser};
use crate::error::{AppError, ValidationError};
use crate::models::{Recipe, User};
use crate::pagination::{request_url, Page, PageParams, RECIPE_PAGE_SIZE};
use crate::services::recipes::{self, RecipeFilter};
use crate::services::relations::{self, RecipeList};
use crate::services::cart;
use crate::shopping_list;
use crate::validation::{validate_recipe, RecipePayload, WriteMode};
use crate::views::{self, RecipeView, ShortRecipeView};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/recipes/", get(list_recipes).post(create_recipe))
        .route("/api/recipes/download_shopping_cart/", get(download_shopping_cart))
        .route(
            "/api/recipes/{id}/",
            get(show_recipe).patch(update_recipe).delete(delete_recipe),
        )
        .route("/api/recipes/{id}/favorite/", post(add_favorite).delete(remove_favorite))
        .route(
            "/api/recipes/{id}/shopping_cart/",
            post(add_to_cart).delete(remove_from_cart),
        )
}

async fn list_recipes(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<PageParams>,
    RawQuery(query): RawQuery,
    uri: Uri,
) -> Result<Json<Page<RecipeView>>, AppError> {
    let filter = RecipeFilter::from_query(query.as_deref().unwrap_or_default());
    let page = params.resolve(RECIPE_PAGE_SIZE);
    let (rows, count) = recipes::list(&state.db, &filter, viewer.id(), &page).await?;
    let results = views::load_recipe_views(&state.db, rows, viewer.id()).await?;

    let current = request_url(&state.config.public_url, &uri);
    Ok(Json(Page::new(results, count, &page, &current)))
}

async fn show_recipe(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<RecipeView>, AppError> {
    let recipe = recipes::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(views::load_recipe_view(&state.db, recipe, viewer.id()).await?))
}

async fn create_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<(StatusCode, Json<RecipeView>), AppError> {
    let Json(payload) = payload?;
    let command = validate_recipe(&state.db, payload, WriteMode::Create).await?;
    let image = command.image().ok_or(ValidationError::NoImage)?;
    let image_ref = state.media.save_image(image).await?;

    let recipe = match recipes::create(&state.db, user.id, &command, &image_ref).await {
        Ok(recipe) => recipe,
        Err(e) => {
            state.media.remove(&image_ref).await;
            return Err(e.into());
        }
    };

    let view = views::load_recipe_view(&state.db, recipe, Some(user.id)).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Loads a recipe the user is allowed to change.
async fn owned_recipe(state: &AppState, user: &User, id: i64) -> Result<Recipe, AppError> {
    let recipe = recipes::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    if recipe.author_id != user.id {
        return Err(AppError::PermissionDenied);
    }
    Ok(recipe)
}

async fn update_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<RecipePayload>, JsonRejection>,
) -> Result<Json<RecipeView>, AppError> {
    let current = owned_recipe(&state, &user, id).await?;
    let Json(payload) = payload?;
    let command = validate_recipe(&state.db, payload, WriteMode::Update).await?;

    let new_image = match command.image() {
        Some(image) => Some(state.media.save_image(image).await?),
        None => None,
    };

    let recipe = match recipes::update(&state.db, id, &command, new_image.as_deref()).await {
        Ok(recipe) => recipe,
        Err(e) => {
            if let Some(image_ref) = &new_image {
                state.media.remove(image_ref).await;
            }
            return Err(e.into());
        }
    };
    if new_image.is_some() {
        state.media.remove(&current.image).await;
    }

    Ok(Json(views::load_recipe_view(&state.db, recipe, Some(user.id)).await?))
}

async fn delete_recipe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    let recipe = owned_recipe(&state, &user, id).await?;
    recipes::delete(&state.db, recipe.id).await?;
    state.media.remove(&recipe.image).await;
    Ok(StatusCode::NO_CONTENT)
}

async fn mark_recipe(
    state: &AppState,
    list: RecipeList,
    user: &User,
    id: i64,
) -> Result<(StatusCode, Json<ShortRecipeView>), AppError> {
    relations::add_recipe(&state.db, list, user.id, id).await?;
    let recipe = recipes::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok((StatusCode::CREATED, Json(ShortRecipeView::from(&recipe))))
}

async fn add_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipeView>), AppError> {
    mark_recipe(&state, RecipeList::Favorites, &user, id).await
}

async fn remove_favorite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    relations::remove_recipe(&state.db, RecipeList::Favorites, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<ShortRecipeView>), AppError> {
    mark_recipe(&state, RecipeList::ShoppingCart, &user, id).await
}

async fn remove_from_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    relations::remove_recipe(&state.db, RecipeList::ShoppingCart, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn download_shopping_cart(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let lines = cart::aggregate(&state.db, user.id).await?;
    let body = shopping_list::render(&user.full_name(), chrono::Utc::now(), &lines)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static(shopping_list::CONTENT_DISPOSITION),
    );

    tracing::info!(user_id = user.id, lines = lines.len(), "Shopping list exported");
    Ok((headers, body))
}
