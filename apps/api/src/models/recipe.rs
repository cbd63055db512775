use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use crate::generation::normalize::CanonicalRecipe;
use crate::models::image::ImageView;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: i32,
    pub rating: Option<i32>,
    pub tags: String,
    pub category: String,
    pub description: String,
    pub ingredients: String,
    pub directions: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecipeRow {
    pub fn to_canonical(&self) -> CanonicalRecipe {
        CanonicalRecipe {
            user_id: Some(self.user_id),
            title: self.title.clone(),
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty: self.difficulty,
            rating: self.rating,
            tags: self.tags.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            ingredients: self.ingredients.clone(),
            directions: self.directions.clone(),
        }
    }
}

/// Recipe as rendered in API responses, with its derived aggregate and images.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeView {
    #[serde(flatten)]
    pub recipe: RecipeRow,
    /// Mean of all ratings, two decimals; `null` when unrated.
    pub average_rating: Option<f64>,
    pub ratings_count: usize,
    pub images: Vec<ImageView>,
}
