//! crates/job_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Application, ApplicationFields, DocumentRef, DocumentSlot, FileUpload, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    ServiceUnavailable(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent user identities and password hashes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fails with `Conflict` if the email is already registered.
    async fn create_user(&self, name: &str, email: &str, hashed_password: &str) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;
}

/// Persistent application records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn create_application(&self, user_id: Uuid, fields: &ApplicationFields) -> PortResult<Application>;

    /// Newest-created first.
    async fn list_applications_by_user(&self, user_id: Uuid) -> PortResult<Vec<Application>>;

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application>;

    /// Replaces every editable field in a single write. Owner and documents are untouched.
    async fn update_application(
        &self,
        application_id: Uuid,
        fields: &ApplicationFields,
    ) -> PortResult<Application>;

    /// Writes both halves of the slot's reference in a single write.
    async fn set_document(
        &self,
        application_id: Uuid,
        slot: DocumentSlot,
        document: &DocumentRef,
    ) -> PortResult<Application>;

    async fn delete_application(&self, application_id: Uuid) -> PortResult<()>;
}

/// External object storage for uploaded documents.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Uploads a file under `folder` and returns its public URL and deletion handle.
    async fn put(&self, folder: &str, upload: &FileUpload) -> PortResult<DocumentRef>;

    /// Deletes the object identified by the handle returned from `put`.
    async fn delete(&self, storage_id: &str) -> PortResult<()>;
}

/// A hosted language model that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerationService: Send + Sync {
    async fn generate_text(&self, prompt: &str, max_tokens: u32) -> PortResult<String>;
}
