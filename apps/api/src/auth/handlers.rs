//! Axum route handlers for sign-up and sign-in.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::crypto::{hash_password, verify_password};
use crate::auth::queries::{create_session, find_user_by_email, insert_user};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Single-field alternative to `first_name`.
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
    pub user_id: Uuid,
    pub name: Option<String>,
}

/// POST /users
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let email = non_blank(request.email.as_deref())
        .map(normalize_email)
        .ok_or_else(|| AppError::BadRequest("Email can't be blank".to_string()))?;
    let password = request
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Password can't be blank".to_string()))?;
    if let Some(confirmation) = request.password_confirmation.as_deref() {
        if confirmation != password {
            return Err(AppError::BadRequest(
                "Password confirmation doesn't match Password".to_string(),
            ));
        }
    }

    let password_hash = hash_password(password)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {e}")))?;

    let first_name = non_blank(request.first_name.as_deref()).or(non_blank(request.name.as_deref()));
    let user = insert_user(
        &state.db,
        first_name,
        non_blank(request.last_name.as_deref()),
        &email,
        &password_hash,
    )
    .await
    .map_err(|e| AppError::conflict_on_unique(e, "Email has already been taken"))?;

    info!("Created user {}", user.id);
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "User created successfully".to_string(),
            user_id: user.id,
        }),
    ))
}

/// POST /sessions
///
/// Unknown email and wrong password both answer 401.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, Json<LoginResponse>), AppError> {
    let user = find_user_by_email(&state.db, &normalize_email(&request.email))
        .await?
        .filter(|u| verify_password(&request.password, &u.password_hash))
        .ok_or(AppError::Unauthorized)?;

    let token = create_session(&state.db, user.id).await?;
    info!("Issued session for user {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(LoginResponse {
            token,
            name: user.display_name(),
            email: user.email,
            user_id: user.id,
        }),
    ))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Emails are stored and looked up trimmed and lowercased.
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
