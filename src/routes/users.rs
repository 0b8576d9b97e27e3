use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::auth::{AuthUser, MaybeUser};
use crate::error::AppError;
use crate::pagination::{request_url, Page, PageParams, USER_PAGE_SIZE};
use crate::services::{relations, users};
use crate::views::{self, RegisteredUserView, SubscriptionView, UserView};
use crate::AppState;

#[derive(Deserialize)]
pub struct PasswordChange {
    new_password: Option<String>,
    current_password: Option<String>,
}

#[derive(Deserialize)]
pub struct RecipesLimit {
    recipes_limit: Option<i64>,
}

impl RecipesLimit {
    fn get(&self) -> Option<i64> {
        self.recipes_limit.filter(|limit| *limit >= 0)
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/", get(list_users).post(register))
        .route("/api/users/me/", get(me))
        .route("/api/users/set_password/", post(set_password))
        .route("/api/users/subscriptions/", get(subscriptions))
        .route("/api/users/{id}/", get(show_user))
        .route("/api/users/{id}/subscribe/", post(subscribe).delete(unsubscribe))
}

async fn list_users(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Query(params): Query<PageParams>,
    uri: Uri,
) -> Result<Json<Page<UserView>>, AppError> {
    let page = params.resolve(USER_PAGE_SIZE);
    let (rows, count) = users::list(&state.db, &page).await?;

    let mut results = Vec::with_capacity(rows.len());
    for user in &rows {
        results.push(views::load_user_view(&state.db, user, viewer.id()).await?);
    }

    let current = request_url(&state.config.public_url, &uri);
    Ok(Json(Page::new(results, count, &page, &current)))
}

async fn register(
    State(state): State<AppState>,
    form: Result<Json<users::Registration>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisteredUserView>), AppError> {
    let Json(form) = form?;
    let user = users::register(&state.db, form).await?;
    Ok((StatusCode::CREATED, Json(RegisteredUserView::from(&user))))
}

async fn me(State(state): State<AppState>, AuthUser(user): AuthUser) -> Result<Json<UserView>, AppError> {
    Ok(Json(views::load_user_view(&state.db, &user, Some(user.id)).await?))
}

async fn show_user(
    State(state): State<AppState>,
    viewer: MaybeUser,
    Path(id): Path<i64>,
) -> Result<Json<UserView>, AppError> {
    let user = users::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(views::load_user_view(&state.db, &user, viewer.id()).await?))
}

async fn set_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    form: Result<Json<PasswordChange>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(form) = form?;
    users::set_password(
        &state.db,
        &user,
        form.current_password.as_deref().unwrap_or_default(),
        form.new_password.as_deref(),
    )
    .await?;
    tracing::info!(user_id = user.id, "Password changed");
    Ok(StatusCode::NO_CONTENT)
}

async fn subscriptions(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<PageParams>,
    Query(limit): Query<RecipesLimit>,
    uri: Uri,
) -> Result<Json<Page<SubscriptionView>>, AppError> {
    let page = params.resolve(USER_PAGE_SIZE);
    let (authors, count) = relations::followed_users(&state.db, user.id, &page).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in &authors {
        results.push(views::load_subscription_view(&state.db, author, user.id, limit.get()).await?);
    }

    let current = request_url(&state.config.public_url, &uri);
    Ok(Json(Page::new(results, count, &page, &current)))
}

async fn subscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
    Query(limit): Query<RecipesLimit>,
) -> Result<(StatusCode, Json<SubscriptionView>), AppError> {
    relations::follow(&state.db, user.id, id).await?;
    let author = users::find(&state.db, id).await?.ok_or(AppError::NotFound)?;
    let view = views::load_subscription_view(&state.db, &author, user.id, limit.get()).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn unsubscribe(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    relations::unfollow(&state.db, user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
