//! JSON shapes returned by the API. Rows are turned into views here, with
//! viewer-relative flags filled in by the `load_*` helpers.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::media::media_url;
use crate::models::{IngredientAmount, Recipe, Tag, User};
use crate::services::relations::{self, RecipeList};
use crate::services::{recipes, users};

/// User as returned right after registration.
#[derive(Debug, Serialize)]
pub struct RegisteredUserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for RegisteredUserView {
    fn from(user: &User) -> Self {
        Self {
            email: user.email.clone(),
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub email: String,
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

pub fn user_view(user: &User, is_subscribed: bool) -> UserView {
    UserView {
        email: user.email.clone(),
        id: user.id,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    }
}

pub async fn load_user_view(db: &SqlitePool, user: &User, viewer: Option<i64>) -> Result<UserView, sqlx::Error> {
    let is_subscribed = match viewer {
        Some(viewer) => relations::is_following(db, viewer, user.id).await?,
        None => false,
    };
    Ok(user_view(user, is_subscribed))
}

#[derive(Debug, Serialize)]
pub struct ShortRecipeView {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub cooking_time: i64,
}

impl From<&Recipe> for ShortRecipeView {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            image: media_url(&recipe.image),
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RecipeView {
    pub id: i64,
    pub tags: Vec<Tag>,
    pub author: UserView,
    pub ingredients: Vec<IngredientAmount>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
}

pub async fn load_recipe_view(db: &SqlitePool, recipe: Recipe, viewer: Option<i64>) -> Result<RecipeView, sqlx::Error> {
    let author = users::find(db, recipe.author_id)
        .await?
        .ok_or(sqlx::Error::RowNotFound)?;
    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(viewer) => (
            relations::contains(db, RecipeList::Favorites, viewer, recipe.id).await?,
            relations::contains(db, RecipeList::ShoppingCart, viewer, recipe.id).await?,
        ),
        None => (false, false),
    };

    Ok(RecipeView {
        id: recipe.id,
        tags: recipes::tags_of(db, recipe.id).await?,
        author: load_user_view(db, &author, viewer).await?,
        ingredients: recipes::ingredients_of(db, recipe.id).await?,
        is_favorited,
        is_in_shopping_cart,
        image: media_url(&recipe.image),
        name: recipe.name,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

pub async fn load_recipe_views(
    db: &SqlitePool,
    recipes: Vec<Recipe>,
    viewer: Option<i64>,
) -> Result<Vec<RecipeView>, sqlx::Error> {
    let mut views = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        views.push(load_recipe_view(db, recipe, viewer).await?);
    }
    Ok(views)
}

/// A followed author together with their latest recipes.
#[derive(Debug, Serialize)]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub user: UserView,
    pub recipes: Vec<ShortRecipeView>,
    pub recipes_count: i64,
}

pub async fn load_subscription_view(
    db: &SqlitePool,
    author: &User,
    viewer: i64,
    recipes_limit: Option<i64>,
) -> Result<SubscriptionView, sqlx::Error> {
    let recipes = recipes::by_author(db, author.id, recipes_limit).await?;
    Ok(SubscriptionView {
        user: load_user_view(db, author, Some(viewer)).await?,
        recipes: recipes.iter().map(ShortRecipeView::from).collect(),
        recipes_count: recipes::count_by_author(db, author.id).await?,
    })
}
