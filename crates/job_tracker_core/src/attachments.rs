//! crates/job_tracker_core/src/attachments.rs
//!
//! Coordinates object storage and the record store when documents are
//! attached to, or reclaimed from, an application.
//!
//! Upload and delete are independent network calls. When they disagree the
//! manager prefers an orphaned remote object over a record that points at a
//! deleted one, or over losing a fresh upload.

use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::{Application, DocumentRef, DocumentSlot, FileUpload};
use crate::ports::{ApplicationStore, ObjectStorage, PortError, PortResult};
use crate::validation::validate_document;

pub struct DocumentAttachmentManager {
    store: Arc<dyn ApplicationStore>,
    storage: Arc<dyn ObjectStorage>,
    folder_root: String,
}

impl DocumentAttachmentManager {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        storage: Arc<dyn ObjectStorage>,
        folder_root: impl Into<String>,
    ) -> Self {
        Self {
            store,
            storage,
            folder_root: folder_root.into(),
        }
    }

    /// Remote folder for an application's documents, namespaced by owner and record.
    pub fn folder_for(&self, application: &Application) -> String {
        format!(
            "{}/{}/{}",
            self.folder_root.trim_end_matches('/'),
            application.user_id,
            application.id
        )
    }

    /// Replaces the document in `slot` with `upload`.
    ///
    /// `application` must already have passed the ownership guard.
    pub async fn attach(
        &self,
        application: &Application,
        slot: DocumentSlot,
        upload: &FileUpload,
    ) -> PortResult<Application> {
        validate_document(upload)?;
        let stored = self.upload(application, slot, upload).await?;
        self.record(application, slot, stored).await
    }

    /// Attaches several documents at once.
    ///
    /// Every file is validated before the first upload starts, and every file
    /// is uploaded before the record is touched. If any upload fails, the
    /// objects already uploaded by this call are discarded and the record is
    /// left as it was.
    pub async fn attach_all(
        &self,
        application: Application,
        uploads: Vec<(DocumentSlot, FileUpload)>,
    ) -> PortResult<Application> {
        if uploads.is_empty() {
            return Err(PortError::Validation("No files were uploaded".to_string()));
        }
        for (_, upload) in &uploads {
            validate_document(upload)?;
        }

        let mut stored: Vec<(DocumentSlot, DocumentRef)> = Vec::with_capacity(uploads.len());
        for (slot, upload) in &uploads {
            match self.upload(&application, *slot, upload).await {
                Ok(document) => stored.push((*slot, document)),
                Err(e) => {
                    self.discard(&application, &stored).await;
                    return Err(e);
                }
            }
        }

        let mut current = application;
        for (slot, document) in stored {
            current = self.record(&current, slot, document).await?;
        }
        Ok(current)
    }

    async fn upload(
        &self,
        application: &Application,
        slot: DocumentSlot,
        upload: &FileUpload,
    ) -> PortResult<DocumentRef> {
        let stored = self
            .storage
            .put(&self.folder_for(application), upload)
            .await?;
        info!(
            application_id = %application.id,
            slot = %slot,
            storage_id = %stored.storage_id,
            "Uploaded document"
        );
        Ok(stored)
    }

    /// Drops the object currently in `slot`, best effort, and points the slot at `stored`.
    async fn record(
        &self,
        application: &Application,
        slot: DocumentSlot,
        stored: DocumentRef,
    ) -> PortResult<Application> {
        if let Some(previous) = application.document(slot) {
            if let Err(e) = self.storage.delete(&previous.storage_id).await {
                warn!(
                    application_id = %application.id,
                    slot = %slot,
                    storage_id = %previous.storage_id,
                    error = %e,
                    "Failed to delete replaced document; leaving it orphaned"
                );
            }
        }

        self.store.set_document(application.id, slot, &stored).await
    }

    /// Removes objects uploaded by a batch that will not be recorded.
    async fn discard(&self, application: &Application, stored: &[(DocumentSlot, DocumentRef)]) {
        for (slot, document) in stored {
            if let Err(e) = self.storage.delete(&document.storage_id).await {
                warn!(
                    application_id = %application.id,
                    slot = %slot,
                    storage_id = %document.storage_id,
                    error = %e,
                    "Failed to discard upload from an aborted batch"
                );
            }
        }
    }

    /// Deletes every stored document of an application that is about to be removed.
    ///
    /// Failures are logged and returned, never raised.
    pub async fn reclaim(&self, application: &Application) -> Vec<PortError> {
        let mut failures = Vec::new();
        for (slot, document) in application.documents() {
            if let Err(e) = self.storage.delete(&document.storage_id).await {
                warn!(
                    application_id = %application.id,
                    slot = %slot,
                    storage_id = %document.storage_id,
                    error = %e,
                    "Failed to delete document of removed application"
                );
                failures.push(e);
            }
        }
        failures
    }
}
