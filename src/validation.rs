use regex::Regex;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::error::{AppError, ValidationError};
use crate::media::{decode_image, DecodedImage};

pub const MIN_AMOUNT: i64 = 1;
pub const MAX_AMOUNT: i64 = 32_767;
pub const MIN_COOKING_TIME: i64 = 1;
pub const MAX_NAME_LENGTH: usize = 200;
pub const MAX_USER_FIELD_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#([A-Fa-f0-9]{6}|[A-Fa-f0-9]{3})$").unwrap());
static SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").unwrap());
static USERNAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

pub fn validate_hex_color(color: &str) -> Result<(), ValidationError> {
    if HEX_COLOR.is_match(color) {
        Ok(())
    } else {
        Err(ValidationError::InvalidColor)
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.len() <= MAX_NAME_LENGTH && SLUG.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSlug)
    }
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.chars().count() > MAX_USER_FIELD_LENGTH || !USERNAME.is_match(username) {
        return Err(ValidationError::field(
            "username",
            "Enter a valid username. Letters, digits and @/./+/-/_ only.",
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.contains('@'),
        None => false,
    };
    if !valid || email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::field("email", "Enter a valid email address."));
    }
    Ok(())
}

/// Checks a required free-text field: present, non-blank, bounded.
pub fn require_text(field: &'static str, value: Option<&str>, max_len: usize) -> Result<String, ValidationError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(ValidationError::field(field, "This field may not be blank."));
    }
    if value.chars().count() > max_len {
        return Err(ValidationError::field(
            field,
            format!("Ensure this field has no more than {max_len} characters."),
        ));
    }
    Ok(value.to_string())
}

/// Integers arrive either as JSON numbers or as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StringOrInt {
    Int(i64),
    String(String),
    /// Floats, booleans and anything else that is not an integer.
    Other(serde::de::IgnoredAny),
}

impl StringOrInt {
    fn as_int(&self) -> Option<i64> {
        match self {
            StringOrInt::Int(i) => Some(*i),
            StringOrInt::String(s) => s.trim().parse().ok(),
            StringOrInt::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientLinePayload {
    pub id: i64,
    #[serde(default)]
    pub amount: Option<StringOrInt>,
}

/// Recipe body as sent by clients on create and update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePayload {
    pub ingredients: Option<Vec<IngredientLinePayload>>,
    pub tags: Option<Vec<i64>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<StringOrInt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngredientLine {
    pub id: i64,
    pub amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// A recipe write that passed every check. Only `validate_recipe` builds one.
#[derive(Debug)]
pub struct RecipeCommand {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) cooking_time: i64,
    pub(crate) tags: Vec<i64>,
    pub(crate) ingredients: Vec<IngredientLine>,
    pub(crate) image: Option<DecodedImage>,
}

impl RecipeCommand {
    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }
}

fn ingredient_lines(items: &[IngredientLinePayload]) -> Vec<(i64, Option<i64>)> {
    items.iter().map(|item| (item.id, item.amount.as_ref().and_then(StringOrInt::as_int))).collect()
}

/// Ingredient rules, in order: non-empty, all exist, no repeats, amounts
/// within `MIN_AMOUNT..=MAX_AMOUNT`.
pub fn check_ingredients(
    items: &[(i64, Option<i64>)],
    known: &HashSet<i64>,
) -> Result<Vec<IngredientLine>, ValidationError> {
    if items.is_empty() {
        return Err(ValidationError::NoIngredients);
    }
    if items.iter().any(|(id, _)| !known.contains(id)) {
        return Err(ValidationError::IngredientsDoesntExist);
    }
    let mut seen = HashSet::new();
    if !items.iter().all(|(id, _)| seen.insert(*id)) {
        return Err(ValidationError::UniqueIngredients);
    }
    items
        .iter()
        .map(|(id, amount)| match amount {
            Some(amount) if (MIN_AMOUNT..=MAX_AMOUNT).contains(amount) => Ok(IngredientLine {
                id: *id,
                amount: *amount,
            }),
            _ => Err(ValidationError::InvalidAmount),
        })
        .collect()
}

/// Tag rules, in order: non-empty, all exist, no repeats.
pub fn check_tags(ids: &[i64], known: &HashSet<i64>) -> Result<Vec<i64>, ValidationError> {
    if ids.is_empty() {
        return Err(ValidationError::NoTags);
    }
    if ids.iter().any(|id| !known.contains(id)) {
        return Err(ValidationError::TagsDoesntExist);
    }
    let mut seen = HashSet::new();
    if !ids.iter().all(|id| seen.insert(*id)) {
        return Err(ValidationError::UniqueTags);
    }
    Ok(ids.to_vec())
}

async fn existing_ids(db: &SqlitePool, table: &str, ids: &[i64]) -> Result<HashSet<i64>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(HashSet::new());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT id FROM {table} WHERE id IN ("));
    let mut separated = qb.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    let rows: Vec<(i64,)> = qb.build_query_as().fetch_all(db).await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Runs every recipe write check against the catalogue before anything is
/// written. The first failing rule wins.
pub async fn validate_recipe(
    db: &SqlitePool,
    payload: RecipePayload,
    mode: WriteMode,
) -> Result<RecipeCommand, AppError> {
    let lines = ingredient_lines(payload.ingredients.as_deref().unwrap_or_default());
    let ingredient_ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
    let known = existing_ids(db, "ingredients", &ingredient_ids).await?;
    let ingredients = check_ingredients(&lines, &known)?;

    let tag_ids = payload.tags.unwrap_or_default();
    let known = existing_ids(db, "tags", &tag_ids).await?;
    let tags = check_tags(&tag_ids, &known)?;

    let image = match payload.image.as_deref().map(str::trim) {
        Some(data) if !data.is_empty() => Some(decode_image(data)?),
        _ if mode == WriteMode::Create => return Err(ValidationError::NoImage.into()),
        _ => None,
    };

    let name = require_text("name", payload.name.as_deref(), MAX_NAME_LENGTH)
        .map_err(|_| ValidationError::InvalidName)?;
    let text = require_text("text", payload.text.as_deref(), usize::MAX)?;

    let cooking_time = payload
        .cooking_time
        .as_ref()
        .and_then(StringOrInt::as_int)
        .filter(|minutes| *minutes >= MIN_COOKING_TIME)
        .ok_or(ValidationError::InvalidCookingTime)?;

    Ok(RecipeCommand {
        name,
        text,
        cooking_time,
        tags,
        ingredients,
        image,
    })
}
