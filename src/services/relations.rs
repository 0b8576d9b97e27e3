//! Favorite, shopping cart and follow toggles.
//!
//! Each (actor, target) pair is either absent or present. Adding a present
//! pair fails with `AlreadyExists`, removing an absent one with `NotFound`.
//! Duplicate detection is left to the primary keys so concurrent requests
//! resolve the same way as sequential ones.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::error::AppError;
use crate::models::{Follow, RecipeMark, User};
use crate::pagination::PageRequest;
use crate::services::{recipes, users};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    fn table(self) -> &'static str {
        match self {
            RecipeList::Favorites => "favorites",
            RecipeList::ShoppingCart => "cart_items",
        }
    }

    fn duplicate_message(self) -> &'static str {
        match self {
            RecipeList::Favorites => "Recipe is already in your favorites.",
            RecipeList::ShoppingCart => "Recipe is already in your shopping cart.",
        }
    }
}

pub async fn add_recipe(
    db: &SqlitePool,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<RecipeMark, AppError> {
    if recipes::find(db, recipe_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let mark: RecipeMark = sqlx::query_as(&format!(
        "INSERT INTO {} (user_id, recipe_id, created_at) VALUES (?, ?, ?) RETURNING *",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(db)
    .await
    .map_err(|e| AppError::on_insert(e, list.duplicate_message()))?;

    Ok(mark)
}

pub async fn remove_recipe(
    db: &SqlitePool,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<(), AppError> {
    if recipes::find(db, recipe_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let result = sqlx::query(&format!(
        "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .execute(db)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn contains(
    db: &SqlitePool,
    list: RecipeList,
    user_id: i64,
    recipe_id: i64,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(&format!(
        "SELECT EXISTS(SELECT 1 FROM {} WHERE user_id = ? AND recipe_id = ?)",
        list.table()
    ))
    .bind(user_id)
    .bind(recipe_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

pub async fn follow(db: &SqlitePool, follower_id: i64, followee_id: i64) -> Result<Follow, AppError> {
    if users::find(db, followee_id).await?.is_none() {
        return Err(AppError::NotFound);
    }
    if follower_id == followee_id {
        return Err(AppError::SelfFollow);
    }

    let follow: Follow = sqlx::query_as(
        "INSERT INTO follows (follower_id, followee_id, created_at) VALUES (?, ?, ?) RETURNING *",
    )
    .bind(follower_id)
    .bind(followee_id)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(db)
    .await
    .map_err(|e| AppError::on_insert(e, "You are already subscribed to this user."))?;

    Ok(follow)
}

pub async fn unfollow(db: &SqlitePool, follower_id: i64, followee_id: i64) -> Result<(), AppError> {
    if users::find(db, followee_id).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let result = sqlx::query("DELETE FROM follows WHERE follower_id = ? AND followee_id = ?")
        .bind(follower_id)
        .bind(followee_id)
        .execute(db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}

pub async fn is_following(db: &SqlitePool, follower_id: i64, followee_id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE follower_id = ? AND followee_id = ?)",
    )
    .bind(follower_id)
    .bind(followee_id)
    .fetch_one(db)
    .await?;
    Ok(exists)
}

/// Users followed by `follower_id`, in subscription order.
pub async fn followed_users(
    db: &SqlitePool,
    follower_id: i64,
    page: &PageRequest,
) -> Result<(Vec<User>, i64), sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM follows WHERE follower_id = ?")
        .bind(follower_id)
        .fetch_one(db)
        .await?;

    let users = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN follows f ON f.followee_id = u.id
        WHERE f.follower_id = ?
        ORDER BY f.created_at, u.id
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(follower_id)
    .bind(page.limit)
    .bind(page.offset)
    .fetch_all(db)
    .await?;

    Ok((users, count))
}
