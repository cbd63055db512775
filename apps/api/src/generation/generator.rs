//! Recipe Generation: orchestrates one generate-from-ingredients request.
//!
//! Flow: validate input → build prompt → chat → extract JSON
//!       (→ one strict retry at temperature 0) → normalize →
//!       preview, or validate + persist + best-effort illustration.
//!
//! The three failure kinds stay distinct for callers: `Upstream` (the model
//! call failed), `UnparseableResponse` (it answered, but with no JSON object)
//! and `ValidationFailed` (the normalized record was rejected on save).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::extract::extract_json_object;
use crate::generation::normalize::{normalize_recipe, CanonicalRecipe, NormalizeContext};
use crate::generation::prompts::{
    build_recipe_prompt, recipe_image_prompt, Prompt, RecipePromptParams,
};
use crate::generation::settings::GenerationSettings;
use crate::llm_client::prompts::strict_retry_prompt;
use crate::llm_client::{ChatModel, ChatRequest};
use crate::models::recipe::RecipeRow;
use crate::recipes::queries::insert_recipe;
use crate::recipes::validation::validate_recipe;
use crate::storage::images::attach_images;
use crate::storage::{ImageStore, NewImage, OwnerKind};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// Request body for `POST /recipes/generate_from_ingredients`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRecipeRequest {
    #[serde(default)]
    pub ingredients: Vec<String>,
    pub diet: Option<String>,
    pub servings: Option<i32>,
    /// Wins over whatever category the model proposes.
    pub category: Option<String>,
    #[serde(default)]
    pub save: bool,
}

/// The parsed model output next to what the normalizer made of it.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDraft {
    pub generated: Map<String, Value>,
    pub normalized: CanonicalRecipe,
}

#[derive(Debug, Clone)]
pub struct SavedRecipe {
    pub recipe: RecipeRow,
    pub image_attached: bool,
}

// ────────────────────────────────────────────────────────────────────────────
// Pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Runs the model and normalizer without touching the database.
pub async fn draft_recipe(
    llm: &dyn ChatModel,
    settings: &GenerationSettings,
    request: &GenerateRecipeRequest,
    user_id: Option<Uuid>,
) -> Result<RecipeDraft, AppError> {
    let ingredients: Vec<String> = request
        .ingredients
        .iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    if ingredients.is_empty() {
        return Err(AppError::BadRequest(
            "ingredients must be a non-empty list".to_string(),
        ));
    }

    let prompt = build_recipe_prompt(&RecipePromptParams {
        ingredients: &ingredients,
        diet: request.diet.as_deref(),
        servings: request.servings,
        category: request.category.as_deref(),
        allowed_categories: &settings.allowed_categories,
    });

    info!("Generating recipe from {} ingredient(s)", ingredients.len());
    let generated = complete_json(llm, settings, &prompt, settings.recipe_temperature).await?;

    let normalized = normalize_recipe(
        &generated,
        &NormalizeContext {
            user_id,
            category: request.category.as_deref(),
        },
        &settings.defaults,
    );

    Ok(RecipeDraft {
        generated,
        normalized,
    })
}

/// Validates and stores a normalized recipe for `owner`, then tries to
/// illustrate it. The illustration never fails the save.
pub async fn save_recipe_draft(
    pool: &PgPool,
    store: &ImageStore,
    llm: &dyn ChatModel,
    settings: &GenerationSettings,
    owner: Uuid,
    mut normalized: CanonicalRecipe,
) -> Result<SavedRecipe, AppError> {
    normalized.user_id = Some(owner);
    validate_recipe(&normalized)?;

    let recipe = insert_recipe(pool, owner, &normalized).await?;
    info!("Saved generated recipe {} for user {}", recipe.id, owner);

    let prompt = recipe_image_prompt(&recipe.title, &recipe.ingredients);
    let image_attached = attach_generated_image(
        pool,
        store,
        llm,
        &settings.image_size,
        OwnerKind::Recipe,
        recipe.id,
        &prompt,
    )
    .await;

    Ok(SavedRecipe {
        recipe,
        image_attached,
    })
}

/// Asks the model for one JSON object. When the answer holds none, retries
/// exactly once with a strict "JSON only" directive at the retry temperature.
pub async fn complete_json(
    llm: &dyn ChatModel,
    settings: &GenerationSettings,
    prompt: &Prompt,
    temperature: f32,
) -> Result<Map<String, Value>, AppError> {
    let first = llm
        .chat(ChatRequest::system_user(
            &settings.chat_model,
            &prompt.system,
            &prompt.user,
            temperature,
            settings.max_tokens,
        ))
        .await?;

    if let Some(object) = extract_json_object(&first) {
        return Ok(object);
    }

    warn!(
        "Model answer held no JSON object ({} chars), retrying with strict prompt",
        first.len()
    );

    let retry = llm
        .chat(ChatRequest::system_user(
            &settings.chat_model,
            &prompt.system,
            &strict_retry_prompt(&prompt.user),
            settings.retry_temperature,
            settings.max_tokens,
        ))
        .await?;

    extract_json_object(&retry).ok_or_else(|| {
        warn!("Strict retry still held no JSON object");
        AppError::UnparseableResponse { raw: retry }
    })
}

/// Generates, downloads and attaches one illustration. Returns whether an
/// image was attached; every failure is logged and swallowed.
pub async fn attach_generated_image(
    pool: &PgPool,
    store: &ImageStore,
    llm: &dyn ChatModel,
    size: &str,
    kind: OwnerKind,
    owner_id: Uuid,
    prompt: &str,
) -> bool {
    let bytes = match llm.generate_image(prompt, size).await {
        Ok(url) => match llm.download(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Image download failed for {} {owner_id}: {}: {e}", kind.as_str(), e.kind());
                return false;
            }
        },
        Err(e) => {
            warn!("Image generation failed for {} {owner_id}: {}: {e}", kind.as_str(), e.kind());
            return false;
        }
    };

    let image = NewImage {
        filename: format!("{}-{owner_id}.png", kind.as_str()),
        content_type: "image/png".to_string(),
        bytes,
    };

    match attach_images(pool, store, kind, owner_id, std::slice::from_ref(&image)).await {
        Ok(_) => true,
        Err(e) => {
            warn!("Could not store generated image for {} {owner_id}: {e}", kind.as_str());
            false
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
