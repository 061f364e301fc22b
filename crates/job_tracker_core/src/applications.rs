//! crates/job_tracker_core/src/applications.rs
//!
//! Owner-scoped CRUD over application records. Every operation on a specific
//! record goes through the ownership guard first.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::attachments::DocumentAttachmentManager;
use crate::domain::{Application, ApplicationInput, DocumentSlot, FileUpload};
use crate::ownership::authorize;
use crate::ports::{ApplicationStore, ObjectStorage, PortResult};
use crate::validation::{validate_application_changes, validate_new_application};

pub struct ApplicationService {
    store: Arc<dyn ApplicationStore>,
    attachments: DocumentAttachmentManager,
}

impl ApplicationService {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        storage: Arc<dyn ObjectStorage>,
        upload_folder: impl Into<String>,
    ) -> Self {
        let attachments = DocumentAttachmentManager::new(store.clone(), storage, upload_folder);
        Self { store, attachments }
    }

    pub async fn create(&self, owner: Uuid, input: ApplicationInput) -> PortResult<Application> {
        let fields = validate_new_application(input, Utc::now())?;
        let application = self.store.create_application(owner, &fields).await?;
        info!(application_id = %application.id, user_id = %owner, "Created application");
        Ok(application)
    }

    /// The owner filter is part of the query, so no guard is needed here.
    pub async fn list(&self, owner: Uuid) -> PortResult<Vec<Application>> {
        self.store.list_applications_by_user(owner).await
    }

    pub async fn get(&self, application_id: Uuid, requester: Uuid) -> PortResult<Application> {
        authorize(self.store.as_ref(), application_id, requester).await
    }

    /// Partial update: fields absent from `changes` keep their current value.
    pub async fn update(
        &self,
        application_id: Uuid,
        requester: Uuid,
        changes: ApplicationInput,
    ) -> PortResult<Application> {
        let current = authorize(self.store.as_ref(), application_id, requester).await?;
        let fields = validate_application_changes(&current.fields, changes)?;
        self.store.update_application(application_id, &fields).await
    }

    /// Removes the record after a best-effort cleanup of its stored documents.
    pub async fn delete(&self, application_id: Uuid, requester: Uuid) -> PortResult<Uuid> {
        let application = authorize(self.store.as_ref(), application_id, requester).await?;

        let failures = self.attachments.reclaim(&application).await;
        if !failures.is_empty() {
            warn!(
                application_id = %application_id,
                failed = failures.len(),
                "Deleting application with unreclaimed documents"
            );
        }

        self.store.delete_application(application_id).await?;
        info!(application_id = %application_id, "Deleted application");
        Ok(application_id)
    }

    pub async fn upload_documents(
        &self,
        application_id: Uuid,
        requester: Uuid,
        uploads: Vec<(DocumentSlot, FileUpload)>,
    ) -> PortResult<Application> {
        let application = authorize(self.store.as_ref(), application_id, requester).await?;
        self.attachments.attach_all(application, uploads).await
    }
}
