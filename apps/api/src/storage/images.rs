//! Image sets owned by recipes and restaurants: blob upload paired with the
//! `images` table rows.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::image::{ImageRow, ImageView};
use crate::storage::{ImageStore, NewImage, OwnerKind};

/// Uploads every image, returning `(key, image)` pairs. On failure the blobs
/// uploaded so far are removed again.
async fn upload_all<'a>(
    store: &ImageStore,
    kind: OwnerKind,
    owner_id: Uuid,
    images: &'a [NewImage],
) -> Result<Vec<(String, &'a NewImage)>, AppError> {
    let mut uploaded = Vec::with_capacity(images.len());
    for image in images {
        match store.put(kind, owner_id, image).await {
            Ok(key) => uploaded.push((key, image)),
            Err(e) => {
                let keys: Vec<String> = uploaded.into_iter().map(|(k, _)| k).collect();
                store.delete_best_effort(&keys).await;
                return Err(e.into());
            }
        }
    }
    Ok(uploaded)
}

async fn insert_rows(
    tx: &mut Transaction<'_, Postgres>,
    kind: OwnerKind,
    owner_id: Uuid,
    uploaded: &[(String, &NewImage)],
    first_position: i32,
) -> Result<Vec<ImageRow>, sqlx::Error> {
    let mut rows = Vec::with_capacity(uploaded.len());
    for (offset, (key, image)) in uploaded.iter().enumerate() {
        let row = sqlx::query_as::<_, ImageRow>(
            r#"
            INSERT INTO images (owner_kind, owner_id, s3_key, filename, content_type, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, owner_id, s3_key, filename, content_type
            "#,
        )
        .bind(kind.as_str())
        .bind(owner_id)
        .bind(key)
        .bind(&image.filename)
        .bind(&image.content_type)
        .bind(first_position + offset as i32)
        .fetch_one(&mut **tx)
        .await?;
        rows.push(row);
    }
    Ok(rows)
}

/// Appends images to an owner's set.
pub async fn attach_images(
    pool: &PgPool,
    store: &ImageStore,
    kind: OwnerKind,
    owner_id: Uuid,
    images: &[NewImage],
) -> Result<Vec<ImageRow>, AppError> {
    if images.is_empty() {
        return Ok(Vec::new());
    }
    let uploaded = upload_all(store, kind, owner_id, images).await?;

    let result = async {
        let mut tx = pool.begin().await?;
        let next_position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM images WHERE owner_kind = $1 AND owner_id = $2",
        )
        .bind(kind.as_str())
        .bind(owner_id)
        .fetch_one(&mut *tx)
        .await?;
        let rows = insert_rows(&mut tx, kind, owner_id, &uploaded, next_position).await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>(rows)
    }
    .await;

    match result {
        Ok(rows) => {
            info!(
                "Attached {} image(s) to {} {}",
                rows.len(),
                kind.as_str(),
                owner_id
            );
            Ok(rows)
        }
        Err(e) => {
            let keys: Vec<String> = uploaded.into_iter().map(|(k, _)| k).collect();
            store.delete_best_effort(&keys).await;
            Err(e.into())
        }
    }
}

/// Replaces an owner's whole image set. The old rows are purged and the new
/// rows attached in one transaction, so readers see either the old set or the
/// new one. Old blobs are deleted only after commit.
pub async fn replace_images(
    pool: &PgPool,
    store: &ImageStore,
    kind: OwnerKind,
    owner_id: Uuid,
    images: &[NewImage],
) -> Result<Vec<ImageRow>, AppError> {
    let uploaded = upload_all(store, kind, owner_id, images).await?;

    let result = async {
        let mut tx = pool.begin().await?;
        let old_keys = purge_image_rows(&mut tx, kind, owner_id).await?;
        let rows = insert_rows(&mut tx, kind, owner_id, &uploaded, 0).await?;
        tx.commit().await?;
        Ok::<_, sqlx::Error>((old_keys, rows))
    }
    .await;

    match result {
        Ok((old_keys, rows)) => {
            store.delete_best_effort(&old_keys).await;
            info!(
                "Replaced {} image(s) with {} on {} {}",
                old_keys.len(),
                rows.len(),
                kind.as_str(),
                owner_id
            );
            Ok(rows)
        }
        Err(e) => {
            warn!("Image replace rolled back for {} {owner_id}", kind.as_str());
            let keys: Vec<String> = uploaded.into_iter().map(|(k, _)| k).collect();
            store.delete_best_effort(&keys).await;
            Err(e.into())
        }
    }
}

/// Removes an owner's image rows inside the caller's transaction and returns
/// the blob keys to delete once that transaction commits.
pub async fn purge_image_rows(
    tx: &mut Transaction<'_, Postgres>,
    kind: OwnerKind,
    owner_id: Uuid,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "DELETE FROM images WHERE owner_kind = $1 AND owner_id = $2 RETURNING s3_key",
    )
    .bind(kind.as_str())
    .bind(owner_id)
    .fetch_all(&mut **tx)
    .await
}

/// Loads the images of many owners in one query, grouped per owner in position order.
pub async fn load_images(
    pool: &PgPool,
    store: &ImageStore,
    kind: OwnerKind,
    owner_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<ImageView>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ImageRow>(
        r#"
        SELECT id, owner_id, s3_key, filename, content_type FROM images
        WHERE owner_kind = $1 AND owner_id = ANY($2)
        ORDER BY owner_id, position, created_at
        "#,
    )
    .bind(kind.as_str())
    .bind(owner_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<Uuid, Vec<ImageView>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.owner_id)
            .or_default()
            .push(to_view(store, &row));
    }
    Ok(grouped)
}

pub fn to_view(store: &ImageStore, row: &ImageRow) -> ImageView {
    ImageView {
        id: row.id,
        url: store.public_url(&row.s3_key),
        filename: row.filename.clone(),
        content_type: row.content_type.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_purge_removes_only_the_owners_rows_and_returns_keys() {
        let Some(pool) = test_pool().await else {
            return;
        };
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();
        for (owner_id, key) in [(owner, "a.png"), (owner, "b.png"), (other, "c.png")] {
            sqlx::query(
                r#"
                INSERT INTO images (owner_kind, owner_id, s3_key, filename, content_type)
                VALUES ('recipe', $1, $2, $2, 'image/png')
                "#,
            )
            .bind(owner_id)
            .bind(key)
            .execute(&pool)
            .await
            .unwrap();
        }

        let mut tx = pool.begin().await.unwrap();
        let mut keys = purge_image_rows(&mut tx, OwnerKind::Recipe, owner)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["a.png".to_string(), "b.png".to_string()]);

        let remaining: Vec<Uuid> =
            sqlx::query_scalar("SELECT owner_id FROM images WHERE owner_id = ANY($1)")
                .bind(&[owner, other][..])
                .fetch_all(&pool)
                .await
                .unwrap();
        assert_eq!(remaining, vec![other]);

        sqlx::query("DELETE FROM images WHERE owner_id = $1")
            .bind(other)
            .execute(&pool)
            .await
            .unwrap();
    }
}
