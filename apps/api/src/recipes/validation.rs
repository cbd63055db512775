//! Declarative checks run before a recipe is written. Messages read like
//! full sentences so clients can show them as-is.

use crate::errors::AppError;
use crate::generation::normalize::CanonicalRecipe;

/// Every rule the recipe breaks, in field order. Empty when valid.
pub fn recipe_errors(recipe: &CanonicalRecipe) -> Vec<String> {
    let mut errors = Vec::new();

    let required = [
        ("Title", &recipe.title),
        ("Category", &recipe.category),
        ("Description", &recipe.description),
        ("Ingredients", &recipe.ingredients),
    ];
    for (label, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("{label} can't be blank"));
        }
    }

    let positive = [
        ("Prep time", Some(recipe.prep_time)),
        ("Cook time", Some(recipe.cook_time)),
        ("Difficulty", Some(recipe.difficulty)),
        ("Rating", recipe.rating),
        ("Servings", Some(recipe.servings)),
    ];
    for (label, value) in positive {
        if value.is_some_and(|v| v <= 0) {
            errors.push(format!("{label} must be greater than 0"));
        }
    }

    errors
}

pub fn validate_recipe(recipe: &CanonicalRecipe) -> Result<(), AppError> {
    validate_recipe_with(recipe, Vec::new())
}

/// Like `validate_recipe`, with messages the caller already collected (for
/// example fields that could not be coerced) listed first.
pub fn validate_recipe_with(
    recipe: &CanonicalRecipe,
    mut errors: Vec<String>,
) -> Result<(), AppError> {
    errors.extend(recipe_errors(recipe));
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(errors))
    }
}
