use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::auth::{login_user, logout_user, AuthUser};
use crate::error::{AppError, ValidationError};
use crate::services::users;
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/token/login/", post(login))
        .route("/api/auth/token/logout/", post(logout))
}

async fn login(
    State(state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(payload) = payload?;
    let (Some(email), Some(password)) = (payload.email, payload.password) else {
        return Err(ValidationError::InvalidCredentials.into());
    };
    let user = users::authenticate(&state.db, &email, &password).await?;
    login_user(&session, &user).await?;
    tracing::info!(user_id = user.id, "User logged in");
    Ok(StatusCode::NO_CONTENT)
}

async fn logout(session: Session, AuthUser(user): AuthUser) -> Result<StatusCode, AppError> {
    logout_user(&session).await?;
    tracing::info!(user_id = user.id, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}
