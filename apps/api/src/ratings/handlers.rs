//! Axum route handlers for recipe ratings.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::ratings::queries::{rating_values, upsert_rating};
use crate::ratings::{average_rating, RATING_RANGE};
use crate::recipes::queries::find_recipe;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RateRequest {
    /// Kept loose so "7" and 7.0 are read the same way as 7.
    pub value: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct RateResponse {
    pub message: String,
    pub average_rating: Option<f64>,
    pub user_rating: i32,
}

#[derive(Debug, Serialize)]
pub struct RatingSummary {
    pub average_rating: Option<f64>,
    pub ratings_count: usize,
}

/// POST /recipes/:id/ratings
pub async fn handle_rate_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    Json(request): Json<RateRequest>,
) -> Result<Json<RateResponse>, AppError> {
    find_recipe(&state.db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))?;

    let value = parse_rating(request.value.as_ref())?;
    let rating = upsert_rating(&state.db, user.id, recipe_id, value).await?;
    info!("User {} rated recipe {} {}", user.id, recipe_id, rating.value);

    let values = rating_values(&state.db, recipe_id).await?;

    Ok(Json(RateResponse {
        message: "Rating saved successfully".to_string(),
        average_rating: average_rating(&values),
        user_rating: rating.value,
    }))
}

/// GET /recipes/:id/ratings
pub async fn handle_rating_summary(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<RatingSummary>, AppError> {
    find_recipe(&state.db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))?;

    let values = rating_values(&state.db, recipe_id).await?;
    Ok(Json(RatingSummary {
        average_rating: average_rating(&values),
        ratings_count: values.len(),
    }))
}

/// Missing → 400; non-integer or outside 1..=10 → 422. Never clamped.
fn parse_rating(value: Option<&Value>) -> Result<i32, AppError> {
    let value = value
        .filter(|v| !v.is_null())
        .ok_or_else(|| AppError::BadRequest("value is required".to_string()))?;

    let parsed = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    match parsed.and_then(|n| i32::try_from(n).ok()) {
        Some(n) if RATING_RANGE.contains(&n) => Ok(n),
        Some(_) => Err(AppError::ValidationFailed(vec![format!(
            "Value must be between {} and {}",
            RATING_RANGE.start(),
            RATING_RANGE.end()
        )])),
        None => Err(AppError::ValidationFailed(vec![
            "Value is not a number".to_string()
        ])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rating_accepts_in_range_shapes() {
        assert_eq!(parse_rating(Some(&json!(7))).unwrap(), 7);
        assert_eq!(parse_rating(Some(&json!("9"))).unwrap(), 9);
        assert_eq!(parse_rating(Some(&json!(10.0))).unwrap(), 10);
    }

    #[test]
    fn test_parse_rating_rejects_out_of_range_without_clamping() {
        for bad in [json!(0), json!(11), json!(-3)] {
            match parse_rating(Some(&bad)) {
                Err(AppError::ValidationFailed(messages)) => {
                    assert_eq!(messages, vec!["Value must be between 1 and 10".to_string()])
                }
                other => panic!("unexpected result for {bad}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_parse_rating_rejects_non_numbers() {
        assert!(matches!(
            parse_rating(Some(&json!("great"))),
            Err(AppError::ValidationFailed(_))
        ));
        assert!(matches!(
            parse_rating(Some(&json!(7.5))),
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_parse_rating_missing_is_bad_request() {
        assert!(matches!(parse_rating(None), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_rating(Some(&Value::Null)),
            Err(AppError::BadRequest(_))
        ));
    }
}
