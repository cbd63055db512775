use serde::Deserialize;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::restaurant::{RestaurantAttrs, RestaurantRow, RestaurantView};
use crate::storage::images::{load_images, purge_image_rows};
use crate::storage::{ImageStore, OwnerKind};

/// Optional `GET /restaurants` filters. Absent filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RestaurantFilter {
    pub price: Option<i32>,
    pub min_rating: Option<f64>,
    pub city: Option<String>,
    pub food_type: Option<String>,
}

pub async fn list_restaurants(
    pool: &PgPool,
    filter: &RestaurantFilter,
) -> Result<Vec<RestaurantRow>, sqlx::Error> {
    let city = filter.city.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let food_type = filter
        .food_type
        .as_deref()
        .map(str::trim)
        .filter(|f| !f.is_empty());

    sqlx::query_as::<_, RestaurantRow>(
        r#"
        SELECT * FROM restaurants
        WHERE ($1::INT IS NULL OR price = $1)
          AND ($2::DOUBLE PRECISION IS NULL OR rating >= $2)
          AND ($3::TEXT IS NULL OR LOWER(city) = LOWER($3))
          AND ($4::TEXT IS NULL OR food_type ILIKE '%' || $4 || '%')
        ORDER BY name
        "#,
    )
    .bind(filter.price)
    .bind(filter.min_rating)
    .bind(city)
    .bind(food_type)
    .fetch_all(pool)
    .await
}

pub async fn find_restaurant(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<RestaurantRow>, sqlx::Error> {
    sqlx::query_as::<_, RestaurantRow>("SELECT * FROM restaurants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Inserts a validated restaurant. A taken name is a `Conflict`.
pub async fn insert_restaurant(
    pool: &PgPool,
    owner: Option<Uuid>,
    attrs: &RestaurantAttrs,
) -> Result<RestaurantRow, AppError> {
    sqlx::query_as::<_, RestaurantRow>(
        r#"
        INSERT INTO restaurants
            (user_id, name, price, rating, food_type, category, description,
             phone_number, website, email, address, city, state, zip_code,
             latitude, longitude, opening_hours, delivery_option, vegan_friendly,
             kid_friendly, parking)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                $15, $16, $17, $18, $19, $20, $21)
        RETURNING *
        "#,
    )
    .bind(owner)
    .bind(attrs.name.as_deref().map(str::trim))
    .bind(attrs.price)
    .bind(attrs.rating)
    .bind(&attrs.food_type)
    .bind(&attrs.category)
    .bind(&attrs.description)
    .bind(&attrs.phone_number)
    .bind(&attrs.website)
    .bind(&attrs.email)
    .bind(&attrs.address)
    .bind(&attrs.city)
    .bind(&attrs.state)
    .bind(&attrs.zip_code)
    .bind(attrs.latitude)
    .bind(attrs.longitude)
    .bind(&attrs.opening_hours)
    .bind(attrs.delivery_option.unwrap_or(false))
    .bind(attrs.vegan_friendly.unwrap_or(false))
    .bind(attrs.kid_friendly.unwrap_or(false))
    .bind(&attrs.parking)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, name_taken(attrs)))
}

/// Overwrites every writable column with `attrs` (already merged with the row).
pub async fn update_restaurant(
    pool: &PgPool,
    id: Uuid,
    attrs: &RestaurantAttrs,
) -> Result<RestaurantRow, AppError> {
    sqlx::query_as::<_, RestaurantRow>(
        r#"
        UPDATE restaurants SET
            name = $2, price = $3, rating = $4, food_type = $5, category = $6,
            description = $7, phone_number = $8, website = $9, email = $10,
            address = $11, city = $12, state = $13, zip_code = $14,
            latitude = $15, longitude = $16, opening_hours = $17,
            delivery_option = $18, vegan_friendly = $19, kid_friendly = $20,
            parking = $21, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(attrs.name.as_deref().map(str::trim))
    .bind(attrs.price)
    .bind(attrs.rating)
    .bind(&attrs.food_type)
    .bind(&attrs.category)
    .bind(&attrs.description)
    .bind(&attrs.phone_number)
    .bind(&attrs.website)
    .bind(&attrs.email)
    .bind(&attrs.address)
    .bind(&attrs.city)
    .bind(&attrs.state)
    .bind(&attrs.zip_code)
    .bind(attrs.latitude)
    .bind(attrs.longitude)
    .bind(&attrs.opening_hours)
    .bind(attrs.delivery_option.unwrap_or(false))
    .bind(attrs.vegan_friendly.unwrap_or(false))
    .bind(attrs.kid_friendly.unwrap_or(false))
    .bind(&attrs.parking)
    .fetch_one(pool)
    .await
    .map_err(|e| AppError::conflict_on_unique(e, name_taken(attrs)))
}

pub async fn delete_restaurant(
    pool: &PgPool,
    store: &ImageStore,
    id: Uuid,
) -> Result<(), AppError> {
    let mut tx = pool.begin().await?;
    let keys = purge_image_rows(&mut tx, OwnerKind::Restaurant, id).await?;
    sqlx::query("DELETE FROM restaurants WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    store.delete_best_effort(&keys).await;
    info!("Deleted restaurant {} and {} image(s)", id, keys.len());
    Ok(())
}

pub async fn load_restaurant_views(
    pool: &PgPool,
    store: &ImageStore,
    rows: Vec<RestaurantRow>,
) -> Result<Vec<RestaurantView>, sqlx::Error> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let mut images = load_images(pool, store, OwnerKind::Restaurant, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|restaurant| RestaurantView {
            images: images.remove(&restaurant.id).unwrap_or_default(),
            restaurant,
        })
        .collect())
}

pub async fn load_restaurant_view(
    pool: &PgPool,
    store: &ImageStore,
    row: RestaurantRow,
) -> Result<RestaurantView, sqlx::Error> {
    load_restaurant_views(pool, store, vec![row])
        .await?
        .pop()
        .ok_or(sqlx::Error::RowNotFound)
}

fn name_taken(attrs: &RestaurantAttrs) -> String {
    format!(
        "Name has already been taken: {}",
        attrs.name.as_deref().unwrap_or_default().trim()
    )
}
