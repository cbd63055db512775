use crate::errors::AppError;
use crate::models::restaurant::RestaurantAttrs;

pub fn restaurant_errors(attrs: &RestaurantAttrs) -> Vec<String> {
    let mut errors = Vec::new();
    if attrs.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        errors.push("Name can't be blank".to_string());
    }
    if attrs.price.is_some_and(|p| !(1..=4).contains(&p)) {
        errors.push("Price must be between 1 and 4".to_string());
    }
    if attrs.rating.is_some_and(|r| !(0.0..=5.0).contains(&r)) {
        errors.push("Rating must be between 0 and 5".to_string());
    }
    errors
}

pub fn validate_restaurant(attrs: &RestaurantAttrs) -> Result<(), AppError> {
    let errors = restaurant_errors(attrs);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationFailed(errors))
    }
}
