use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::rating::RatingRow;

/// Find-or-create by (user, recipe): a second rating overwrites the first.
pub async fn upsert_rating(
    pool: &PgPool,
    user_id: Uuid,
    recipe_id: Uuid,
    value: i32,
) -> Result<RatingRow, sqlx::Error> {
    sqlx::query_as::<_, RatingRow>(
        r#"
        INSERT INTO ratings (user_id, recipe_id, value)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, recipe_id)
        DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .bind(value)
    .fetch_one(pool)
    .await
}

pub async fn rating_values(pool: &PgPool, recipe_id: Uuid) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar("SELECT value FROM ratings WHERE recipe_id = $1")
        .bind(recipe_id)
        .fetch_all(pool)
        .await
}

/// Rating values for many recipes in one query, grouped per recipe.
pub async fn rating_values_for(
    pool: &PgPool,
    recipe_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<i32>>, sqlx::Error> {
    let rows: Vec<(Uuid, i32)> =
        sqlx::query_as("SELECT recipe_id, value FROM ratings WHERE recipe_id = ANY($1)")
            .bind(recipe_ids)
            .fetch_all(pool)
            .await?;

    let mut grouped: HashMap<Uuid, Vec<i32>> = HashMap::new();
    for (recipe_id, value) in rows {
        grouped.entry(recipe_id).or_default().push(value);
    }
    Ok(grouped)
}
