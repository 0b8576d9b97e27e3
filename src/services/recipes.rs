use chrono::{SecondsFormat, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::{IngredientAmount, Recipe, RecipeIngredient, Tag};
use crate::pagination::PageRequest;
use crate::validation::{IngredientLine, RecipeCommand};

/// Query-string filters of the recipe list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    pub author: Option<i64>,
    /// Tag slugs; a recipe matches when it has any of them.
    pub tags: Vec<String>,
    pub is_favorited: Option<bool>,
    pub is_in_shopping_cart: Option<bool>,
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

impl RecipeFilter {
    /// Parses a raw query string. `tags` may repeat; unknown keys and
    /// malformed values are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut filter = RecipeFilter::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "author" => filter.author = value.parse().ok(),
                "tags" if !value.is_empty() => filter.tags.push(value.into_owned()),
                "is_favorited" => filter.is_favorited = parse_flag(&value),
                "is_in_shopping_cart" => filter.is_in_shopping_cart = parse_flag(&value),
                _ => {}
            }
        }
        filter
    }

    fn needs_viewer(&self) -> bool {
        self.is_favorited.is_some() || self.is_in_shopping_cart.is_some()
    }

    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>, viewer: Option<i64>) {
        qb.push(" WHERE 1 = 1");
        if let Some(author) = self.author {
            qb.push(" AND r.author_id = ").push_bind(author);
        }
        if !self.tags.is_empty() {
            qb.push(
                " AND r.id IN (SELECT rt.recipe_id FROM recipe_tags rt \
                 JOIN tags t ON t.id = rt.tag_id WHERE t.slug IN (",
            );
            let mut slugs = qb.separated(", ");
            for slug in &self.tags {
                slugs.push_bind(slug.clone());
            }
            slugs.push_unseparated("))");
        }
        if let Some(viewer) = viewer {
            for (flag, table) in [
                (self.is_favorited, "favorites"),
                (self.is_in_shopping_cart, "cart_items"),
            ] {
                let Some(flag) = flag else { continue };
                qb.push(if flag { " AND r.id IN" } else { " AND r.id NOT IN" });
                qb.push(format!(" (SELECT recipe_id FROM {table} WHERE user_id = "))
                    .push_bind(viewer)
                    .push(")");
            }
        }
    }
}

pub async fn find(db: &SqlitePool, id: i64) -> Result<Option<Recipe>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Newest first. Viewer-relative filters match nothing for anonymous
/// viewers.
pub async fn list(
    db: &SqlitePool,
    filter: &RecipeFilter,
    viewer: Option<i64>,
    page: &PageRequest,
) -> Result<(Vec<Recipe>, i64), sqlx::Error> {
    if filter.needs_viewer() && viewer.is_none() {
        return Ok((Vec::new(), 0));
    }

    let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM recipes r");
    filter.push_conditions(&mut count_query, viewer);
    let count: i64 = count_query.build_query_scalar().fetch_one(db).await?;

    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT r.* FROM recipes r");
    filter.push_conditions(&mut query, viewer);
    query
        .push(" ORDER BY r.pub_date DESC, r.id DESC LIMIT ")
        .push_bind(page.limit)
        .push(" OFFSET ")
        .push_bind(page.offset);
    let recipes: Vec<Recipe> = query.build_query_as().fetch_all(db).await?;

    Ok((recipes, count))
}

pub async fn tags_of(db: &SqlitePool, recipe_id: i64) -> Result<Vec<Tag>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT t.* FROM tags t
        JOIN recipe_tags rt ON rt.tag_id = t.id
        WHERE rt.recipe_id = ?
        ORDER BY t.name, t.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

pub async fn ingredients_of(db: &SqlitePool, recipe_id: i64) -> Result<Vec<IngredientAmount>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT i.id, i.name, i.measurement_unit, ri.amount
        FROM recipe_ingredients ri
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE ri.recipe_id = ?
        ORDER BY i.name, i.id
        "#,
    )
    .bind(recipe_id)
    .fetch_all(db)
    .await
}

/// Most recent recipes of an author, optionally capped.
pub async fn by_author(db: &SqlitePool, author_id: i64, limit: Option<i64>) -> Result<Vec<Recipe>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM recipes WHERE author_id = ? ORDER BY pub_date DESC, id DESC LIMIT ?",
    )
    .bind(author_id)
    .bind(limit.unwrap_or(-1))
    .fetch_all(db)
    .await
}

pub async fn count_by_author(db: &SqlitePool, author_id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE author_id = ?")
        .bind(author_id)
        .fetch_one(db)
        .await?;
    Ok(count)
}

async fn replace_tags(conn: &mut SqliteConnection, recipe_id: i64, tags: &[i64]) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;
    if tags.is_empty() {
        return Ok(());
    }

    let mut insert: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO recipe_tags (recipe_id, tag_id) ");
    insert.push_values(tags, |mut row, tag_id| {
        row.push_bind(recipe_id).push_bind(*tag_id);
    });
    insert.build().execute(&mut *conn).await?;
    Ok(())
}

async fn replace_ingredients(
    conn: &mut SqliteConnection,
    recipe_id: i64,
    lines: &[IngredientLine],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = ?")
        .bind(recipe_id)
        .execute(&mut *conn)
        .await?;

    let rows: Vec<RecipeIngredient> = lines
        .iter()
        .map(|line| RecipeIngredient {
            recipe_id,
            ingredient_id: line.id,
            amount: line.amount,
        })
        .collect();
    if rows.is_empty() {
        return Ok(());
    }

    let mut insert: QueryBuilder<Sqlite> =
        QueryBuilder::new("INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount) ");
    insert.push_values(rows, |mut row, ri| {
        row.push_bind(ri.recipe_id)
            .push_bind(ri.ingredient_id)
            .push_bind(ri.amount);
    });
    insert.build().execute(&mut *conn).await?;
    Ok(())
}

/// Inserts the recipe with its tags and ingredients in one transaction.
pub async fn create(
    db: &SqlitePool,
    author_id: i64,
    command: &RecipeCommand,
    image_ref: &str,
) -> Result<Recipe, sqlx::Error> {
    let mut tx = db.begin().await?;

    let recipe: Recipe = sqlx::query_as(
        r#"
        INSERT INTO recipes (author_id, name, image, text, cooking_time, pub_date)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(author_id)
    .bind(&command.name)
    .bind(image_ref)
    .bind(&command.text)
    .bind(command.cooking_time)
    .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true))
    .fetch_one(&mut *tx)
    .await?;

    replace_tags(&mut *tx, recipe.id, &command.tags).await?;
    replace_ingredients(&mut *tx, recipe.id, &command.ingredients).await?;

    tx.commit().await?;
    tracing::info!(recipe_id = recipe.id, author_id, "Recipe created");
    Ok(recipe)
}

/// Rewrites the recipe fields and rebuilds its tag and ingredient sets from
/// scratch. The whole rebuild is one transaction, so readers see either the
/// old sets or the new ones. `image_ref` of `None` keeps the current image.
pub async fn update(
    db: &SqlitePool,
    recipe_id: i64,
    command: &RecipeCommand,
    image_ref: Option<&str>,
) -> Result<Recipe, sqlx::Error> {
    let mut tx = db.begin().await?;

    let recipe: Recipe = sqlx::query_as(
        r#"
        UPDATE recipes
        SET name = ?, text = ?, cooking_time = ?, image = COALESCE(?, image)
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(&command.name)
    .bind(&command.text)
    .bind(command.cooking_time)
    .bind(image_ref)
    .bind(recipe_id)
    .fetch_one(&mut *tx)
    .await?;

    replace_tags(&mut *tx, recipe_id, &command.tags).await?;
    replace_ingredients(&mut *tx, recipe_id, &command.ingredients).await?;

    tx.commit().await?;
    tracing::info!(recipe_id, "Recipe updated");
    Ok(recipe)
}

/// Junction rows, favorites and cart entries go with it.
pub async fn delete(db: &SqlitePool, recipe_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM recipes WHERE id = ?")
        .bind(recipe_id)
        .execute(db)
        .await?;
    tracing::info!(recipe_id, "Recipe deleted");
    Ok(())
}
