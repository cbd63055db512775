//! `RecipeForm`: recipe input as either a JSON object or a multipart form.
//!
//! Both shapes end up as a field map for the normalizer plus the uploaded
//! images. Repeated multipart keys (`ingredients[]`, `tags[]`) become arrays.

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    Json,
};
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::storage::NewImage;

const IMAGE_FIELDS: &[&str] = &["images", "images[]", "image"];

#[derive(Debug, Default)]
pub struct RecipeForm {
    pub fields: Map<String, Value>,
    pub images: Vec<NewImage>,
}

#[async_trait]
impl<S> FromRequest<S> for RecipeForm
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("multipart/form-data"));

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        match body {
            Value::Object(fields) => Ok(RecipeForm {
                fields,
                images: Vec::new(),
            }),
            _ => Err(AppError::BadRequest(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<RecipeForm, AppError> {
    let mut form = RecipeForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if IMAGE_FIELDS.contains(&name.as_str()) || field.file_name().is_some() {
            let filename = field.file_name().unwrap_or("image").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            if !bytes.is_empty() {
                form.images.push(NewImage {
                    filename,
                    content_type,
                    bytes,
                });
            }
            continue;
        }

        let text = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        insert_field(&mut form.fields, &name, text);
    }

    Ok(form)
}

/// `key[]` always collects into an array; a plain key repeated turns into one.
fn insert_field(fields: &mut Map<String, Value>, name: &str, text: String) {
    let (key, is_list) = match name.strip_suffix("[]") {
        Some(key) => (key, true),
        None => (name, false),
    };

    match fields.get_mut(key) {
        Some(Value::Array(items)) => items.push(Value::String(text)),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, Value::String(text)]);
        }
        None if is_list => {
            fields.insert(key.to_string(), Value::Array(vec![Value::String(text)]));
        }
        None => {
            fields.insert(key.to_string(), Value::String(text));
        }
    }
}
