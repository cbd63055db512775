//! Axum route handlers for the Restaurants API.
//!
//! Write bodies are wrapped: `{"restaurant": {...}}`. Keys outside the
//! writable column set are ignored.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::models::restaurant::{RestaurantAttrs, RestaurantRow, RestaurantView};
use crate::restaurants::queries::{
    delete_restaurant, find_restaurant, insert_restaurant, list_restaurants,
    load_restaurant_view, load_restaurant_views, update_restaurant, RestaurantFilter,
};
use crate::restaurants::validation::validate_restaurant;
use crate::state::AppState;

/// GET /restaurants?price=&min_rating=&city=&food_type=
pub async fn handle_list_restaurants(
    State(state): State<AppState>,
    Query(filter): Query<RestaurantFilter>,
) -> Result<Json<Vec<RestaurantView>>, AppError> {
    let rows = list_restaurants(&state.db, &filter).await?;
    Ok(Json(
        load_restaurant_views(&state.db, &state.images, rows).await?,
    ))
}

/// GET /restaurants/:id
pub async fn handle_get_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> Result<Json<RestaurantView>, AppError> {
    let row = require_restaurant(&state, restaurant_id).await?;
    Ok(Json(load_restaurant_view(&state.db, &state.images, row).await?))
}

/// POST /restaurants
pub async fn handle_create_restaurant(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<RestaurantView>), AppError> {
    let attrs = restaurant_params(body)?;
    validate_restaurant(&attrs)?;

    let row = insert_restaurant(&state.db, Some(user.id), &attrs).await?;
    info!("User {} created restaurant {}", user.id, row.id);

    Ok((
        StatusCode::CREATED,
        Json(load_restaurant_view(&state.db, &state.images, row).await?),
    ))
}

/// PATCH /restaurants/:id
pub async fn handle_update_restaurant(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(restaurant_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<Json<RestaurantView>, AppError> {
    let row = require_restaurant(&state, restaurant_id).await?;
    let attrs = row.to_attrs().overlay(restaurant_params(body)?);
    validate_restaurant(&attrs)?;

    let row = update_restaurant(&state.db, restaurant_id, &attrs).await?;
    Ok(Json(load_restaurant_view(&state.db, &state.images, row).await?))
}

/// DELETE /restaurants/:id
pub async fn handle_delete_restaurant(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(restaurant_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_restaurant(&state, restaurant_id).await?;
    delete_restaurant(&state.db, &state.images, restaurant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn require_restaurant(state: &AppState, id: Uuid) -> Result<RestaurantRow, AppError> {
    find_restaurant(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Restaurant {id} not found")))
}

/// Unwraps the `restaurant` envelope: missing → 400, wrong field types → 422.
fn restaurant_params(body: Value) -> Result<RestaurantAttrs, AppError> {
    let inner = match body {
        Value::Object(mut map) => map.remove("restaurant"),
        _ => None,
    }
    .filter(Value::is_object)
    .ok_or_else(|| AppError::BadRequest("param is missing: restaurant".to_string()))?;

    serde_json::from_value(inner).map_err(|e| AppError::ValidationFailed(vec![e.to_string()]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_params_require_envelope() {
        assert!(matches!(
            restaurant_params(json!({"name": "Green Bowl"})),
            Err(AppError::BadRequest(_))
        ));
        assert!(matches!(
            restaurant_params(json!({"restaurant": "Green Bowl"})),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_params_unwrap_and_whitelist() {
        let attrs = restaurant_params(json!({
            "restaurant": {"name": "Green Bowl", "price": 2, "id": "ignored"}
        }))
        .unwrap();
        assert_eq!(attrs.name.as_deref(), Some("Green Bowl"));
        assert_eq!(attrs.price, Some(2));
    }

    #[test]
    fn test_params_with_wrong_types_fail_validation() {
        assert!(matches!(
            restaurant_params(json!({"restaurant": {"name": "X", "price": "cheap"}})),
            Err(AppError::ValidationFailed(_))
        ));
    }
}
