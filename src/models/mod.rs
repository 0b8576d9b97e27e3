pub mod user;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod relation;

pub use user::User;
pub use tag::{NewTag, Tag};
pub use ingredient::{Ingredient, NewIngredient};
pub use recipe::{IngredientAmount, Recipe, RecipeIngredient};
pub use relation::{Follow, RecipeMark};
