use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A recipe placed on one of a user's lists (favorites or shopping cart).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeMark {
    pub user_id: i64,
    pub recipe_id: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Follow {
    pub follower_id: i64,
    pub followee_id: i64,
    pub created_at: String,
}
