//! Settings handed to the generation orchestrators.
//!
//! Nothing in `generation` reads process environment; `Config` builds one of
//! these at startup and `AppState` carries it.

/// Fallbacks the normalizer applies when a field is missing or unusable.
#[derive(Debug, Clone)]
pub struct RecipeDefaults {
    pub prep_time: i32,
    pub cook_time: i32,
    pub servings: i32,
    pub difficulty: i32,
    pub category: String,
    pub description: String,
}

impl Default for RecipeDefaults {
    fn default() -> Self {
        Self {
            prep_time: 10,
            cook_time: 10,
            servings: 1,
            difficulty: 1,
            category: "Uncategorized".to_string(),
            description: "A home-cooked recipe generated from your ingredients.".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub chat_model: String,
    pub recipe_temperature: f32,
    pub restaurant_temperature: f32,
    /// Temperature used by the single strict "JSON only" retry.
    pub retry_temperature: f32,
    pub max_tokens: u32,
    pub image_size: String,
    /// Advisory list rendered into the recipe prompt. Empty = any category.
    pub allowed_categories: Vec<String>,
    pub defaults: RecipeDefaults,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4".to_string(),
            recipe_temperature: 0.2,
            restaurant_temperature: 0.7,
            retry_temperature: 0.0,
            max_tokens: 800,
            image_size: "1024x1024".to_string(),
            allowed_categories: Vec::new(),
            defaults: RecipeDefaults::default(),
        }
    }
}
