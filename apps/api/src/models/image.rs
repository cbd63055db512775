use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// The `images` columns the API reads back; ordering columns stay in SQL.
#[derive(Debug, Clone, FromRow)]
pub struct ImageRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub s3_key: String,
    pub filename: String,
    pub content_type: String,
}

/// Image as rendered in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ImageView {
    pub id: Uuid,
    pub url: String,
    pub filename: String,
    pub content_type: String,
}
