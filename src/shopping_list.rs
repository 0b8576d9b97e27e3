use askama::Template;
use chrono::{DateTime, Utc};

use crate::services::cart::CartLine;

pub const CONTENT_DISPOSITION: &str = "attachment; filename=shopping_list.txt";

#[derive(Template)]
#[template(path = "shopping_list.txt")]
struct ShoppingListTemplate {
    title: String,
    created: String,
    rows: Vec<String>,
}

/// Quotes a CSV field only when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[&str]) -> String {
    fields.iter().map(|f| csv_field(f)).collect::<Vec<_>>().join(",")
}

/// Renders the downloadable shopping list. Output depends only on the
/// arguments.
pub fn render(owner: &str, generated_at: DateTime<Utc>, lines: &[CartLine]) -> Result<String, askama::Error> {
    let rows = lines
        .iter()
        .map(|line| {
            let total = line.total_amount.to_string();
            csv_row(&[&line.name, &total, &line.measurement_unit])
        })
        .collect();

    ShoppingListTemplate {
        title: csv_field(&format!("Shopping list for: {owner}")),
        created: csv_field(&format!("Created at: {}", generated_at.format("%d.%m.%Y %H:%M"))),
        rows,
    }
    .render()
}
