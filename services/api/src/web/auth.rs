//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, and the current user.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use job_tracker_core::ports::PortError;
use job_tracker_core::validation::{normalize_email, validate_registration};
use job_tracker_core::User;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::web::rest::json_body;
use crate::web::state::{AppState, AuthContext};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Returned by register and login.
#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            name: user.name,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            ApiError::Internal("Failed to hash password".to_string())
        })
}

fn password_matches(password: &str, hashed: &str) -> Result<bool, ApiError> {
    let parsed_hash = PasswordHash::new(hashed).map_err(|e| {
        error!("Failed to parse stored password hash: {:?}", e);
        ApiError::Internal("Authentication error".to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // 1. Validate
    let req = json_body(body)?;
    validate_registration(&req.name, &req.email, &req.password)?;
    let email = normalize_email(&req.email);

    // 2. Hash the password and create the user
    let password_hash = hash_password(&req.password)?;
    let user = state
        .credentials
        .create_user(req.name.trim(), &email, &password_hash)
        .await?;
    info!(user_id = %user.user_id, "Registered user");

    // 3. Issue a token
    let token = state.tokens.issue(user.user_id)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            id: user.user_id,
            name: user.name,
            email: user.email,
            token,
        }),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    ),
    tag = "Auth"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, ApiError> {
    let req = json_body(body)?;
    // Unknown email and wrong password look the same to the caller.
    let credentials = state
        .credentials
        .get_user_by_email(&normalize_email(&req.email))
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => ApiError::unauthorized(INVALID_CREDENTIALS),
            other => ApiError::Port(other),
        })?;

    if !password_matches(&req.password, &credentials.hashed_password)? {
        return Err(ApiError::unauthorized(INVALID_CREDENTIALS));
    }

    let user = credentials.user;
    let token = state.tokens.issue(user.user_id)?;
    Ok(Json(AuthResponse {
        id: user.user_id,
        name: user.name,
        email: user.email,
        token,
    }))
}

/// GET /api/auth/me - The authenticated user's profile
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.credentials.get_user_by_id(auth.user_id).await?;
    Ok(Json(user.into()))
}
