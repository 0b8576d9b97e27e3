//! Administrative commands: catalogue loaders and account creation.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::path::Path;

use crate::models::{NewIngredient, NewTag, User};
use crate::services::{catalog, users};

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Loads a JSON array of `{name, measurement_unit}`. Existing pairs are
/// skipped. Returns the number of rows added.
pub async fn load_ingredients(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let items: Vec<NewIngredient> = read_json(path).await?;
    let total = items.len();

    let mut added = 0;
    for item in &items {
        if item.name.trim().is_empty() || item.measurement_unit.trim().is_empty() {
            tracing::warn!(name = %item.name, "Skipping ingredient with an empty field");
            continue;
        }
        if catalog::insert_ingredient(pool, item).await? {
            added += 1;
        }
    }

    tracing::info!(added, total, "Ingredients loaded");
    Ok(added)
}

/// Loads a JSON array of `{name, color, slug}`. Tags whose slug already
/// exists are skipped; an invalid color or slug aborts before any insert.
pub async fn load_tags(pool: &SqlitePool, path: &Path) -> Result<usize> {
    let items: Vec<NewTag> = read_json(path).await?;
    let tags = items
        .into_iter()
        .map(|tag| {
            let slug = tag.slug.clone();
            tag.validate().with_context(|| format!("Invalid tag '{slug}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut added = 0;
    for tag in &tags {
        if catalog::insert_tag(pool, tag).await? {
            added += 1;
        }
    }

    tracing::info!(added, total = tags.len(), "Tags loaded");
    Ok(added)
}

pub async fn create_user(pool: &SqlitePool, form: users::Registration) -> Result<User> {
    let user = users::register(pool, form)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create user: {e}"))?;

    println!("Created user:");
    println!("  ID: {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Email: {}", user.email);

    Ok(user)
}
