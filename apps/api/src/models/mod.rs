pub mod image;
pub mod rating;
pub mod recipe;
pub mod restaurant;
pub mod user;
