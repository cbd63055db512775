//! Axum route handlers for the Generation API.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::generation::generator::{draft_recipe, save_recipe_draft, GenerateRecipeRequest};
use crate::generation::restaurant::{
    draft_restaurant, save_restaurant_draft, GenerateRestaurantRequest,
};
use crate::models::recipe::RecipeView;
use crate::models::restaurant::RestaurantView;
use crate::recipes::queries::load_recipe_view;
use crate::restaurants::queries::load_restaurant_view;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct GeneratedRecipeResponse {
    pub recipe: RecipeView,
    pub image_attached: bool,
}

#[derive(Debug, Serialize)]
pub struct GeneratedRestaurantResponse {
    pub restaurant: RestaurantView,
    pub image_attached: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /recipes/generate_from_ingredients
///
/// Preview (default): 200 `{generated, normalized}`, nothing stored.
/// `save: true`: requires a session, stores the recipe for the caller and
/// returns 201 `{recipe, image_attached}`.
pub async fn handle_generate_recipe(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Json(request): Json<GenerateRecipeRequest>,
) -> Result<Response, AppError> {
    let owner = match (&user, request.save) {
        (None, true) => return Err(AppError::Unauthorized),
        _ => user.as_ref().map(|u| u.id),
    };

    let draft = draft_recipe(state.llm.as_ref(), &state.settings, &request, owner).await?;

    let Some(owner) = owner.filter(|_| request.save) else {
        return Ok(Json(draft).into_response());
    };

    let saved = save_recipe_draft(
        &state.db,
        &state.images,
        state.llm.as_ref(),
        &state.settings,
        owner,
        draft.normalized,
    )
    .await?;
    let recipe = load_recipe_view(&state.db, &state.images, saved.recipe).await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedRecipeResponse {
            recipe,
            image_attached: saved.image_attached,
        }),
    )
        .into_response())
}

/// POST /restaurants/generate_restaurant
///
/// `save` defaults to true and then requires a session (409 when the name is
/// taken). With `save: false` the preview `{generated, normalized, listing}`
/// is returned.
pub async fn handle_generate_restaurant(
    State(state): State<AppState>,
    user: Option<CurrentUser>,
    Json(request): Json<GenerateRestaurantRequest>,
) -> Result<Response, AppError> {
    if request.save && user.is_none() {
        return Err(AppError::Unauthorized);
    }

    let draft = draft_restaurant(
        state.llm.as_ref(),
        state.places.as_ref(),
        &state.settings,
        &request,
    )
    .await?;

    if !request.save {
        return Ok(Json(draft).into_response());
    }

    let saved = save_restaurant_draft(
        &state.db,
        &state.images,
        state.llm.as_ref(),
        &state.settings,
        user.map(|u| u.id),
        &draft.normalized,
    )
    .await?;
    let restaurant = load_restaurant_view(&state.db, &state.images, saved.restaurant).await?;

    Ok((
        StatusCode::CREATED,
        Json(GeneratedRestaurantResponse {
            restaurant,
            image_attached: saved.image_attached,
        }),
    )
        .into_response())
}
