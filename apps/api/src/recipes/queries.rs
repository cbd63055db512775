use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::generation::normalize::CanonicalRecipe;
use crate::models::recipe::{RecipeRow, RecipeView};
use crate::ratings::average_rating;
use crate::ratings::queries::rating_values_for;
use crate::storage::images::{load_images, purge_image_rows};
use crate::storage::{ImageStore, OwnerKind};

pub async fn insert_recipe(
    pool: &PgPool,
    owner: Uuid,
    recipe: &CanonicalRecipe,
) -> Result<RecipeRow, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        INSERT INTO recipes
            (user_id, title, prep_time, cook_time, servings, difficulty, rating,
             tags, category, description, ingredients, directions)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(owner)
    .bind(&recipe.title)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.servings)
    .bind(recipe.difficulty)
    .bind(recipe.rating)
    .bind(&recipe.tags)
    .bind(&recipe.category)
    .bind(&recipe.description)
    .bind(&recipe.ingredients)
    .bind(&recipe.directions)
    .fetch_one(pool)
    .await
}

/// Overwrites every writable column; the owner never changes.
pub async fn update_recipe(
    pool: &PgPool,
    id: Uuid,
    recipe: &CanonicalRecipe,
) -> Result<RecipeRow, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        UPDATE recipes SET
            title = $2, prep_time = $3, cook_time = $4, servings = $5,
            difficulty = $6, rating = $7, tags = $8, category = $9,
            description = $10, ingredients = $11, directions = $12,
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&recipe.title)
    .bind(recipe.prep_time)
    .bind(recipe.cook_time)
    .bind(recipe.servings)
    .bind(recipe.difficulty)
    .bind(recipe.rating)
    .bind(&recipe.tags)
    .bind(&recipe.category)
    .bind(&recipe.description)
    .bind(&recipe.ingredients)
    .bind(&recipe.directions)
    .fetch_one(pool)
    .await
}

pub async fn find_recipe(pool: &PgPool, id: Uuid) -> Result<Option<RecipeRow>, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_recipes(pool: &PgPool) -> Result<Vec<RecipeRow>, sqlx::Error> {
    sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Deletes the recipe with its ratings and image rows in one transaction, then
/// removes the blobs.
pub async fn delete_recipe(pool: &PgPool, store: &ImageStore, id: Uuid) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let keys = purge_image_rows(&mut tx, OwnerKind::Recipe, id).await?;
    // ratings go with the recipe (ON DELETE CASCADE)
    sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    store.delete_best_effort(&keys).await;
    info!("Deleted recipe {} and {} image(s)", id, keys.len());
    Ok(())
}

/// Attaches the rating aggregate and images to many recipes with one query each.
pub async fn load_recipe_views(
    pool: &PgPool,
    store: &ImageStore,
    rows: Vec<RecipeRow>,
) -> Result<Vec<RecipeView>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut ratings = rating_values_for(pool, &ids).await?;
    let mut images = load_images(pool, store, OwnerKind::Recipe, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|recipe| {
            let values = ratings.remove(&recipe.id).unwrap_or_default();
            RecipeView {
                average_rating: average_rating(&values),
                ratings_count: values.len(),
                images: images.remove(&recipe.id).unwrap_or_default(),
                recipe,
            }
        })
        .collect())
}

pub async fn load_recipe_view(
    pool: &PgPool,
    store: &ImageStore,
    row: RecipeRow,
) -> Result<RecipeView, sqlx::Error> {
    load_recipe_views(pool, store, vec![row])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}
