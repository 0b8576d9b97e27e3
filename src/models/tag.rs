use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ValidationError;
use crate::validation::{validate_hex_color, validate_slug};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub slug: String,
}

/// A tag that has not been stored yet.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl NewTag {
    pub fn validate(self) -> Result<Self, ValidationError> {
        validate_hex_color(&self.color)?;
        validate_slug(&self.slug)?;
        if self.name.trim().is_empty() {
            return Err(ValidationError::InvalidName);
        }
        Ok(Self {
            name: self.name.trim().to_string(),
            color: self.color.to_uppercase(),
            slug: self.slug,
        })
    }
}
