//! Axum route handlers for the Recipes API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::extractor::CurrentUser;
use crate::errors::AppError;
use crate::generation::normalize::{normalize_recipe, NormalizeContext, RecipePatch};
use crate::models::recipe::{RecipeRow, RecipeView};
use crate::recipes::form::RecipeForm;
use crate::recipes::queries::{
    delete_recipe, find_recipe, insert_recipe, list_recipes, load_recipe_view,
    load_recipe_views, update_recipe,
};
use crate::recipes::validation::{validate_recipe, validate_recipe_with};
use crate::state::AppState;
use crate::storage::images::{attach_images, replace_images};
use crate::storage::OwnerKind;

#[derive(Debug, Serialize)]
pub struct RecipeResponse {
    pub message: String,
    pub recipe: RecipeView,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /recipes
pub async fn handle_list_recipes(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecipeView>>, AppError> {
    let rows = list_recipes(&state.db).await?;
    let views = load_recipe_views(&state.db, &state.images, rows).await?;
    Ok(Json(views))
}

/// GET /recipes/:id
pub async fn handle_get_recipe(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<RecipeView>, AppError> {
    let row = require_recipe(&state, recipe_id).await?;
    Ok(Json(load_recipe_view(&state.db, &state.images, row).await?))
}

/// POST /recipes
///
/// Form input goes through the same normalizer as model output, so a list of
/// ingredients, a comma string and `{name, quantity}` objects are all accepted.
pub async fn handle_create_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    form: RecipeForm,
) -> Result<(StatusCode, Json<RecipeResponse>), AppError> {
    let recipe = normalize_recipe(
        &form.fields,
        &NormalizeContext {
            user_id: Some(user.id),
            category: None,
        },
        &state.settings.defaults,
    );
    validate_recipe(&recipe)?;

    let row = insert_recipe(&state.db, user.id, &recipe).await?;
    if let Err(e) = attach_images(
        &state.db,
        &state.images,
        OwnerKind::Recipe,
        row.id,
        &form.images,
    )
    .await
    {
        delete_recipe(&state.db, &state.images, row.id).await?;
        return Err(e);
    }
    info!("User {} created recipe {}", user.id, row.id);

    let recipe = load_recipe_view(&state.db, &state.images, row).await?;
    Ok((
        StatusCode::CREATED,
        Json(RecipeResponse {
            message: "Recipe created successfully".to_string(),
            recipe,
        }),
    ))
}

/// PATCH /recipes/:id
///
/// Only supplied fields change. New images replace the whole prior set.
pub async fn handle_update_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
    form: RecipeForm,
) -> Result<Json<RecipeResponse>, AppError> {
    let row = require_recipe(&state, recipe_id).await?;
    require_owner(&row, &user)?;

    let mut patch = RecipePatch::from_source(&form.fields);
    let invalid = std::mem::take(&mut patch.invalid);
    let recipe = patch.apply(row.to_canonical());
    validate_recipe_with(&recipe, invalid)?;

    let row = update_recipe(&state.db, recipe_id, &recipe).await?;
    if !form.images.is_empty() {
        replace_images(
            &state.db,
            &state.images,
            OwnerKind::Recipe,
            recipe_id,
            &form.images,
        )
        .await?;
    }

    let recipe = load_recipe_view(&state.db, &state.images, row).await?;
    Ok(Json(RecipeResponse {
        message: "Recipe updated successfully".to_string(),
        recipe,
    }))
}

/// DELETE /recipes/:id
pub async fn handle_delete_recipe(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(recipe_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    let row = require_recipe(&state, recipe_id).await?;
    require_owner(&row, &user)?;

    delete_recipe(&state.db, &state.images, recipe_id).await?;
    Ok(Json(MessageResponse {
        message: "Recipe deleted successfully".to_string(),
    }))
}

async fn require_recipe(state: &AppState, recipe_id: Uuid) -> Result<RecipeRow, AppError> {
    find_recipe(&state.db, recipe_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Recipe {recipe_id} not found")))
}

fn require_owner(row: &RecipeRow, user: &CurrentUser) -> Result<(), AppError> {
    if row.user_id == user.id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
