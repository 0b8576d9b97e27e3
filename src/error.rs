use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::validation::{MAX_AMOUNT, MIN_AMOUNT, MIN_COOKING_TIME};

/// Reasons a write payload is rejected before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Recipe must contain at least one ingredient")]
    NoIngredients,
    #[error("Ingredient does not exist")]
    IngredientsDoesntExist,
    #[error("Ingredients of a recipe must not repeat")]
    UniqueIngredients,
    #[error("Ingredient amount must be between {min} and {max}", min = MIN_AMOUNT, max = MAX_AMOUNT)]
    InvalidAmount,
    #[error("Recipe must have at least one tag")]
    NoTags,
    #[error("Tag does not exist")]
    TagsDoesntExist,
    #[error("Tags of a recipe must not repeat")]
    UniqueTags,
    #[error("Recipe must have an image")]
    NoImage,
    #[error("Image must be a base64 encoded PNG, JPEG, GIF or WebP")]
    InvalidImage,
    #[error("Cooking time must be at least {min} minute", min = MIN_COOKING_TIME)]
    InvalidCookingTime,
    #[error("Name must be between 1 and 200 characters")]
    InvalidName,
    #[error("{message}")]
    InvalidField {
        field: &'static str,
        message: String,
    },
    #[error("Current password is incorrect")]
    InvalidPassword,
    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,
    #[error("Color must be a HEX value such as #FFF or #0F0F0F")]
    InvalidColor,
    #[error("Slug may only contain letters, digits, hyphens and underscores")]
    InvalidSlug,
    #[error("{0}")]
    MalformedPayload(String),
}

impl ValidationError {
    pub fn field(field: &'static str, message: impl Into<String>) -> Self {
        ValidationError::InvalidField {
            field,
            message: message.into(),
        }
    }

    /// Machine-readable reason code.
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::NoIngredients => "no_ingredients",
            ValidationError::IngredientsDoesntExist => "ingredients_doesnt_exist",
            ValidationError::UniqueIngredients => "unique_ingredients",
            ValidationError::InvalidAmount => "invalid_amount",
            ValidationError::NoTags => "no_tags",
            ValidationError::TagsDoesntExist => "tags_doesnt_exist",
            ValidationError::UniqueTags => "unique_tags",
            ValidationError::NoImage => "no_image",
            ValidationError::InvalidImage => "invalid_image",
            ValidationError::InvalidCookingTime => "invalid_cooking_time",
            ValidationError::InvalidName => "invalid_name",
            ValidationError::InvalidField { .. } => "invalid_field",
            ValidationError::InvalidPassword => "invalid_password",
            ValidationError::InvalidCredentials => "invalid_credentials",
            ValidationError::InvalidColor => "invalid_color",
            ValidationError::InvalidSlug => "invalid_slug",
            ValidationError::MalformedPayload(_) => "invalid_payload",
        }
    }

    /// Payload field the error refers to, if any.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            ValidationError::NoIngredients
            | ValidationError::IngredientsDoesntExist
            | ValidationError::UniqueIngredients
            | ValidationError::InvalidAmount => Some("ingredients"),
            ValidationError::NoTags
            | ValidationError::TagsDoesntExist
            | ValidationError::UniqueTags => Some("tags"),
            ValidationError::NoImage | ValidationError::InvalidImage => Some("image"),
            ValidationError::InvalidCookingTime => Some("cooking_time"),
            ValidationError::InvalidName => Some("name"),
            ValidationError::InvalidField { field, .. } => Some(*field),
            ValidationError::InvalidPassword => Some("current_password"),
            ValidationError::InvalidCredentials => None,
            ValidationError::InvalidColor => Some("color"),
            ValidationError::InvalidSlug => Some("slug"),
            ValidationError::MalformedPayload(_) => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(sqlx::Error),
    #[error("Template error: {0}")]
    Template(askama::Error),
    #[error("Session error: {0}")]
    Session(tower_sessions::session::Error),
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Password hashing error: {0}")]
    PasswordHash(argon2::password_hash::Error),
    #[error("Background task failed: {0}")]
    Task(tokio::task::JoinError),
    #[error(transparent)]
    Validation(ValidationError),
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    AlreadyExists(&'static str),
    #[error("Permission denied")]
    PermissionDenied,
    #[error("Cannot follow yourself")]
    SelfFollow,
    #[error("Not authenticated")]
    Unauthorized,
}

impl AppError {
    /// Maps a failed insert to `AlreadyExists` when a uniqueness constraint
    /// rejected it, so a lost race reads the same as a duplicate request.
    pub fn on_insert(e: sqlx::Error, message: &'static str) -> Self {
        if is_unique_violation(&e) {
            AppError::AlreadyExists(message)
        } else {
            AppError::Database(e)
        }
    }
}

pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    field: Option<&'static str>,
    detail: String,
}

fn error_response(status: StatusCode, code: &'static str, field: Option<&'static str>, detail: String) -> Response {
    (status, Json(ErrorBody { code, field, detail })).into_response()
}

fn internal_error() -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        None,
        "Internal server error".to_string(),
    )
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(e) => {
                error_response(StatusCode::BAD_REQUEST, e.code(), e.field_name(), e.to_string())
            }
            AppError::NotFound => {
                error_response(StatusCode::NOT_FOUND, "not_found", None, "Not found.".to_string())
            }
            AppError::AlreadyExists(message) => {
                error_response(StatusCode::BAD_REQUEST, "already_exists", None, message.to_string())
            }
            AppError::PermissionDenied => error_response(
                StatusCode::FORBIDDEN,
                "permission_denied",
                None,
                "You do not have permission to perform this action.".to_string(),
            ),
            AppError::SelfFollow => error_response(
                StatusCode::BAD_REQUEST,
                "self_follow",
                None,
                "You cannot subscribe to yourself.".to_string(),
            ),
            AppError::Unauthorized => error_response(
                StatusCode::UNAUTHORIZED,
                "not_authenticated",
                None,
                "Authentication credentials were not provided.".to_string(),
            ),
            e @ (AppError::Database(_)
            | AppError::Template(_)
            | AppError::Session(_)
            | AppError::Io(_)
            | AppError::PasswordHash(_)
            | AppError::Task(_)) => {
                tracing::error!("{e}");
                internal_error()
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Database(e)
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        AppError::Session(e)
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e)
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(e: argon2::password_hash::Error) -> Self {
        AppError::PasswordHash(e)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Task(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationError::MalformedPayload(rejection.body_text()))
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Validation(e)
    }
}
