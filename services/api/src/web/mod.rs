pub mod ai;
pub mod auth;
pub mod dates;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod token;

#[cfg(test)]
mod test_support;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::error::ApiError;

pub use middleware::require_auth;
pub use state::{AppState, AuthContext};

/// Room for both documents at the per-file cap, so oversize files reach the
/// validator instead of being cut off by the transport.
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Builds every `/api` route. Everything except the root, register, and
/// login sits behind `require_auth`.
pub fn router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api", get(rest::root_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(auth::me_handler))
        .route(
            "/api/applications",
            get(rest::list_applications_handler).post(rest::create_application_handler),
        )
        .route(
            "/api/applications/{id}",
            get(rest::get_application_handler)
                .put(rest::update_application_handler)
                .delete(rest::delete_application_handler),
        )
        .route(
            "/api/applications/{id}/upload",
            post(rest::upload_documents_handler),
        )
        .route("/api/ai/generate-cover-letter", post(ai::cover_letter_handler))
        .route("/api/ai/analyze-application", post(ai::analyze_fit_handler))
        .route("/api/ai/suggest-follow-up", post(ai::follow_up_handler))
        .route("/api/ai/success-insights", get(ai::success_insights_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// CORS for the browser client at `client_url`.
pub fn cors_layer(client_url: &str) -> Result<CorsLayer, ApiError> {
    let origin = client_url.parse::<HeaderValue>().map_err(|e| {
        ApiError::Internal(format!("Invalid CLIENT_URL '{}': {}", client_url, e))
    })?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]))
}
