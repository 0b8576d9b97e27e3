use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::auth::{hash_password, verify_password};
use crate::error::{AppError, ValidationError};
use crate::models::User;
use crate::pagination::PageRequest;
use crate::validation::{
    require_text, validate_email, validate_username, MAX_EMAIL_LENGTH, MAX_USER_FIELD_LENGTH,
};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub email: Option<String>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
}

fn require_password(field: &'static str, password: Option<&str>) -> Result<String, ValidationError> {
    match password {
        Some(password) if !password.is_empty() && password.len() <= MAX_USER_FIELD_LENGTH => {
            Ok(password.to_string())
        }
        _ => Err(ValidationError::field(field, "Enter a password of 1 to 150 characters.")),
    }
}

pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn list(db: &SqlitePool, page: &PageRequest) -> Result<(Vec<User>, i64), sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await?;
    let users: Vec<User> = sqlx::query_as("SELECT * FROM users ORDER BY id LIMIT ? OFFSET ?")
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(db)
        .await?;
    Ok((users, count))
}

pub async fn register(db: &SqlitePool, form: Registration) -> Result<User, AppError> {
    let email = require_text("email", form.email.as_deref(), MAX_EMAIL_LENGTH)?;
    validate_email(&email)?;
    let username = require_text("username", form.username.as_deref(), MAX_USER_FIELD_LENGTH)?;
    validate_username(&username)?;
    let first_name = require_text("first_name", form.first_name.as_deref(), MAX_USER_FIELD_LENGTH)?;
    let last_name = require_text("last_name", form.last_name.as_deref(), MAX_USER_FIELD_LENGTH)?;
    let password = require_password("password", form.password.as_deref())?;

    let password_hash = hash_password(password).await?;
    let now = Utc::now().to_rfc3339();

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash, date_joined)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&username)
    .bind(&email)
    .bind(&first_name)
    .bind(&last_name)
    .bind(&password_hash)
    .bind(&now)
    .fetch_one(db)
    .await
    .map_err(|e| AppError::on_insert(e, "A user with that username or email already exists."))?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");
    Ok(user)
}

/// Looks up a user by email and checks the password.
pub async fn authenticate(db: &SqlitePool, email: &str, password: &str) -> Result<User, AppError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email.trim())
        .fetch_optional(db)
        .await?;

    let Some(user) = user else {
        return Err(ValidationError::InvalidCredentials.into());
    };
    if verify_password(password.to_string(), user.password_hash.clone()).await {
        Ok(user)
    } else {
        Err(ValidationError::InvalidCredentials.into())
    }
}

pub async fn set_password(
    db: &SqlitePool,
    user: &User,
    current_password: &str,
    new_password: Option<&str>,
) -> Result<(), AppError> {
    if !verify_password(current_password.to_string(), user.password_hash.clone()).await {
        return Err(ValidationError::InvalidPassword.into());
    }
    let new_password = require_password("new_password", new_password)?;
    let password_hash = hash_password(new_password).await?;

    sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(user.id)
        .execute(db)
        .await?;
    Ok(())
}
