mod auth;
mod config;
mod db;
mod errors;
mod generation;
mod llm_client;
mod models;
mod places;
mod ratings;
mod recipes;
mod restaurants;
mod routes;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use axum::http::{header, HeaderValue, Method};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, LlmClientConfig};
use crate::places::{PlacesClient, DEFAULT_PAGE_DELAY};
use crate::routes::build_router;
use crate::state::AppState;
use crate::storage::ImageStore;

/// First transport retry waits this long; later ones double it.
const LLM_RETRY_BACKOFF: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Larder API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    let images = ImageStore::new(s3, config.s3_bucket.clone(), &config.s3_public_url);
    info!("Image store initialized (bucket: {})", config.s3_bucket);

    // Initialize LLM client
    let llm = LlmClient::new(LlmClientConfig {
        api_key: config.openai_api_key.clone(),
        base_url: config.openai_base_url.clone(),
        image_model: config.openai_image_model.clone(),
        timeout: config.llm_timeout,
        backoff: LLM_RETRY_BACKOFF,
    })
    .context("Failed to build LLM HTTP client")?;
    info!(
        "LLM client initialized (chat: {}, image: {})",
        config.openai_chat_model, config.openai_image_model
    );

    // Places lookup is optional
    let places = match &config.google_places_api_key {
        Some(key) => {
            let client = PlacesClient::new(
                key.clone(),
                &config.google_places_base_url,
                config.llm_timeout,
                DEFAULT_PAGE_DELAY,
            )
            .context("Failed to build places HTTP client")?;
            info!("Places client initialized");
            Some(client)
        }
        None => {
            info!("GOOGLE_PLACES_API_KEY not set; restaurant generation runs without listings");
            None
        }
    };

    // Build app state
    let state = AppState {
        db,
        llm: Arc::new(llm),
        places,
        images,
        settings: config.generation_settings(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config)?);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Only the configured origins when `CORS_ALLOWED_ORIGINS` is set; permissive
/// otherwise (local development).
fn cors_layer(config: &Config) -> Result<CorsLayer> {
    if config.cors_allowed_origins.is_empty() {
        return Ok(CorsLayer::permissive());
    }

    let origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .with_context(|| format!("Invalid CORS origin '{origin}'"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("CORS restricted to {} origin(s)", origins.len());

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
            Method::HEAD,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]))
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "larder-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    // MinIO serves buckets by path, not by virtual host
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
