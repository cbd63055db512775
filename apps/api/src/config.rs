use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::settings::{GenerationSettings, RecipeDefaults};

const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_PLACES_BASE_URL: &str = "https://maps.googleapis.com";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub s3_public_url: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub openai_chat_model: String,
    pub openai_image_model: String,
    pub openai_image_size: String,
    pub llm_timeout: Duration,
    /// `None` disables real-listing lookups for restaurant generation.
    pub google_places_api_key: Option<String>,
    pub google_places_base_url: String,
    pub cors_allowed_origins: Vec<String>,
    pub allowed_categories: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let s3_endpoint = require_env("S3_ENDPOINT")?;
        let s3_bucket = require_env("S3_BUCKET")?;
        let s3_public_url = optional_env("S3_PUBLIC_URL").unwrap_or_else(|| {
            format!("{}/{}", s3_endpoint.trim_end_matches('/'), s3_bucket)
        });

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket,
            s3_endpoint,
            s3_public_url,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            openai_chat_model: optional_env("OPENAI_CHAT_MODEL")
                .unwrap_or_else(|| "gpt-4".to_string()),
            openai_image_model: optional_env("OPENAI_IMAGE_MODEL")
                .unwrap_or_else(|| "dall-e-3".to_string()),
            openai_image_size: optional_env("OPENAI_IMAGE_SIZE")
                .unwrap_or_else(|| "1024x1024".to_string()),
            llm_timeout: Duration::from_secs(
                optional_env("LLM_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("LLM_TIMEOUT_SECS must be a whole number of seconds")?
                    .unwrap_or(60),
            ),
            google_places_api_key: optional_env("GOOGLE_PLACES_API_KEY"),
            google_places_base_url: optional_env("GOOGLE_PLACES_BASE_URL")
                .unwrap_or_else(|| DEFAULT_PLACES_BASE_URL.to_string()),
            cors_allowed_origins: optional_env("CORS_ALLOWED_ORIGINS")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            allowed_categories: optional_env("ALLOWED_CATEGORIES")
                .map(|v| split_list(&v))
                .unwrap_or_default(),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// The explicit settings object handed to the generation orchestrators.
    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            chat_model: self.openai_chat_model.clone(),
            image_size: self.openai_image_size.clone(),
            allowed_categories: self.allowed_categories.clone(),
            defaults: RecipeDefaults::default(),
            ..GenerationSettings::default()
        }
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
