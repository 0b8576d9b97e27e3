use serde::Serialize;
use sqlx::{FromRow, SqlitePool};
use std::collections::BTreeMap;

/// One ingredient line of a cart recipe, before grouping.
#[derive(Debug, Clone, FromRow)]
pub struct CartIngredientRow {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Total amount of one ingredient (in one unit) across the whole cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    pub name: String,
    pub total_amount: i64,
    pub measurement_unit: String,
}

/// Groups rows by (name, unit) and sums amounts, saturating at `i64::MAX`.
/// Output is ordered by name, then unit.
pub fn group_lines(rows: impl IntoIterator<Item = CartIngredientRow>) -> Vec<CartLine> {
    let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
    for row in rows {
        let total = totals.entry((row.name, row.measurement_unit)).or_insert(0);
        *total = total.saturating_add(row.amount);
    }
    totals
        .into_iter()
        .map(|((name, measurement_unit), total_amount)| CartLine {
            name,
            total_amount,
            measurement_unit,
        })
        .collect()
}

/// Shopping list for everything in the user's cart. An empty cart yields
/// an empty list.
pub async fn aggregate(db: &SqlitePool, user_id: i64) -> Result<Vec<CartLine>, sqlx::Error> {
    let rows: Vec<CartIngredientRow> = sqlx::query_as(
        r#"
        SELECT i.name, i.measurement_unit, ri.amount
        FROM cart_items c
        JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
        JOIN ingredients i ON i.id = ri.ingredient_id
        WHERE c.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await?;

    Ok(group_lines(rows))
}
