//! Read access to tags and ingredients, plus the get-or-create inserts the
//! loaders use.

use sqlx::SqlitePool;

use crate::models::{Ingredient, NewIngredient, NewTag, Tag};

pub async fn list_tags(db: &SqlitePool) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tags ORDER BY name, id")
        .fetch_all(db)
        .await
}

pub async fn find_tag(db: &SqlitePool, id: i64) -> Result<Option<Tag>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM tags WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Escapes LIKE wildcards so the prefix is matched literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Case-folded form stored in `search_name`.
fn search_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Ingredients whose name starts with `prefix`, ignoring case in any script.
pub async fn search_ingredients(db: &SqlitePool, prefix: Option<&str>) -> Result<Vec<Ingredient>, sqlx::Error> {
    let pattern = like_prefix(&search_key(prefix.unwrap_or_default()));
    sqlx::query_as(
        "SELECT * FROM ingredients WHERE search_name LIKE ? ESCAPE '\\' ORDER BY name, measurement_unit",
    )
    .bind(pattern)
    .fetch_all(db)
    .await
}

pub async fn find_ingredient(db: &SqlitePool, id: i64) -> Result<Option<Ingredient>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM ingredients WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Returns true when a new row was stored.
pub async fn insert_ingredient(db: &SqlitePool, ingredient: &NewIngredient) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "INSERT INTO ingredients (name, measurement_unit, search_name) VALUES (?, ?, ?) \
         ON CONFLICT (name, measurement_unit) DO NOTHING",
    )
    .bind(ingredient.name.trim())
    .bind(ingredient.measurement_unit.trim())
    .bind(search_key(&ingredient.name))
    .execute(db)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Returns true when a new row was stored. An existing slug is left as is.
pub async fn insert_tag(db: &SqlitePool, tag: &NewTag) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?, ?, ?) ON CONFLICT (slug) DO NOTHING")
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(&tag.slug)
        .execute(db)
        .await?;
    Ok(result.rows_affected() == 1)
}
