//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the per-request auth context.

use crate::web::token::TokenIssuer;
use job_tracker_core::{AiGateway, ApplicationService, CredentialStore};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub applications: Arc<ApplicationService>,
    pub ai: Arc<AiGateway>,
    pub tokens: TokenIssuer,
}

//=========================================================================================
// AuthContext (Specific to One Request)
//=========================================================================================

/// The authenticated caller, resolved by `require_auth` and read by handlers
/// from the request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}
