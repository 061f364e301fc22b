//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use job_tracker_core::ports::PortError;
use std::sync::Arc;
use tracing::warn;

use crate::error::ApiError;
use crate::web::state::{AppState, AuthContext};

/// Middleware that validates the bearer token and resolves the caller.
///
/// If valid, inserts an `AuthContext` into request extensions for handlers to use.
/// If missing, invalid, expired, or its subject no longer exists, returns 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Not authorized, no token"))?;

    // 2. Verify signature and expiry
    let user_id = state.tokens.verify(token)?;

    // 3. Load the subject
    let user = state
        .credentials
        .get_user_by_id(user_id)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => {
                warn!(user_id = %user_id, "Valid token for a user that no longer exists");
                ApiError::unauthorized("Not authorized, user not found")
            }
            other => ApiError::Port(other),
        })?;

    // 4. Hand the caller to the handler
    req.extensions_mut().insert(AuthContext {
        user_id: user.user_id,
        name: user.name,
        email: user.email,
    });

    Ok(next.run(req).await)
}
