pub mod cart;
pub mod catalog;
pub mod recipes;
pub mod relations;
pub mod users;
