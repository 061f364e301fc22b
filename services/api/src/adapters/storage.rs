//! services/api/src/adapters/storage.rs
//!
//! This module contains the adapter for Cloudinary object storage.
//! It implements the `ObjectStorage` port from the `core` crate using the
//! signed Cloudinary upload REST API.

use async_trait::async_trait;
use chrono::Utc;
use job_tracker_core::domain::{DocumentRef, FileUpload};
use job_tracker_core::ports::{ObjectStorage, PortError, PortResult};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CloudinaryConfig;

const API_BASE: &str = "https://api.cloudinary.com/v1_1";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that stores documents as Cloudinary `raw` assets.
#[derive(Clone)]
pub struct CloudinaryStorage {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    /// Creates a new `CloudinaryStorage`.
    pub fn new(http: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/{}/raw/{}", API_BASE, self.config.cloud_name, action)
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct DestroyResponse {
    result: String,
}

/// Cloudinary request signature: the parameters sorted by name, joined as
/// `k=v&k=v`, with the API secret appended, as a hex SHA-1 digest (the
/// account default).
fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// A collision-free public id that keeps the original extension, which raw
/// assets need to be served with the right type.
fn public_id_for(file_name: &str) -> String {
    let (stem, extension) = file_name
        .rsplit_once('.')
        .unwrap_or((file_name, ""));
    let stem: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(60)
        .collect();
    if extension.is_empty() {
        format!("{}-{}", stem, Uuid::new_v4())
    } else {
        format!("{}-{}.{}", stem, Uuid::new_v4(), extension.to_ascii_lowercase())
    }
}

async fn upstream_error(action: &str, response: reqwest::Response) -> PortError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    PortError::ServiceUnavailable(format!(
        "Storage {} failed with status {}: {}",
        action, status, body
    ))
}

fn transport(e: reqwest::Error) -> PortError {
    PortError::ServiceUnavailable(format!("Storage request failed: {}", e))
}

//=========================================================================================
// `ObjectStorage` Trait Implementation
//=========================================================================================

#[async_trait]
impl ObjectStorage for CloudinaryStorage {
    async fn put(&self, folder: &str, upload: &FileUpload) -> PortResult<DocumentRef> {
        let timestamp = Utc::now().timestamp().to_string();
        let params = [
            ("folder", folder.to_string()),
            ("public_id", public_id_for(&upload.file_name)),
            ("timestamp", timestamp),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .part(
                "file",
                Part::bytes(upload.bytes.to_vec()).file_name(upload.file_name.clone()),
            );
        for (key, value) in params {
            form = form.text(key, value);
        }

        debug!(folder, size = upload.bytes.len(), "Uploading document to storage");
        let response = self
            .http
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(upstream_error("upload", response).await);
        }

        let uploaded: UploadResponse = response.json().await.map_err(transport)?;
        info!(storage_id = %uploaded.public_id, "Stored document");
        Ok(DocumentRef {
            url: uploaded.secure_url,
            storage_id: uploaded.public_id,
        })
    }

    async fn delete(&self, storage_id: &str) -> PortResult<()> {
        let params = [
            ("public_id", storage_id.to_string()),
            ("timestamp", Utc::now().timestamp().to_string()),
        ];
        let signature = sign(&params, &self.config.api_secret);

        let mut form: Vec<(&str, String)> = params.to_vec();
        form.push(("api_key", self.config.api_key.clone()));
        form.push(("signature", signature));

        let response = self
            .http
            .post(self.endpoint("destroy"))
            .form(&form)
            .send()
            .await
            .map_err(transport)?;
        if !response.status().is_success() {
            return Err(upstream_error("delete", response).await);
        }

        let destroyed: DestroyResponse = response.json().await.map_err(transport)?;
        match destroyed.result.as_str() {
            // Already gone is as good as deleted.
            "ok" | "not found" => {
                info!(storage_id, result = %destroyed.result, "Deleted stored document");
                Ok(())
            }
            other => Err(PortError::ServiceUnavailable(format!(
                "Storage delete of {} returned '{}'",
                storage_id, other
            ))),
        }
    }
}

/// Stands in when storage credentials are missing, so uploads fail cleanly.
#[derive(Clone, Default)]
pub struct UnconfiguredStorage;

#[async_trait]
impl ObjectStorage for UnconfiguredStorage {
    async fn put(&self, _folder: &str, _upload: &FileUpload) -> PortResult<DocumentRef> {
        Err(PortError::ServiceUnavailable(
            "File storage is not configured".to_string(),
        ))
    }

    async fn delete(&self, _storage_id: &str) -> PortResult<()> {
        Err(PortError::ServiceUnavailable(
            "File storage is not configured".to_string(),
        ))
    }
}
