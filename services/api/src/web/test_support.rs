//! In-memory port implementations and request helpers for router tests.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use job_tracker_core::{
    AiGateway, Application, ApplicationFields, ApplicationService, ApplicationStore,
    CredentialStore, DocumentRef, DocumentSlot, FileUpload, ObjectStorage, PortError, PortResult,
    TextGenerationService, User, UserCredentials,
};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use uuid::Uuid;

use crate::web::{router, state::AppState, token::TokenIssuer};

pub const SECRET: &[u8] = b"router-test-secret";

//=========================================================================================
// Fakes
//=========================================================================================

#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<Vec<UserCredentials>>,
    applications: Mutex<Vec<Application>>,
}

impl InMemoryStore {
    pub fn application(&self, id: Uuid) -> Option<Application> {
        self.applications
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id)
            .cloned()
    }

    fn with_application<T>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut Application) -> T,
    ) -> PortResult<T> {
        let mut applications = self.applications.lock().unwrap();
        let application = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PortError::NotFound(format!("Application {} not found", id)))?;
        Ok(f(application))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn create_user(&self, name: &str, email: &str, hashed_password: &str) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.user.email == email) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }
        let user = User {
            user_id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        users.push(UserCredentials {
            user: user.clone(),
            hashed_password: hashed_password.to_string(),
        });
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.user.user_id == user_id)
            .map(|u| u.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

#[async_trait]
impl ApplicationStore for InMemoryStore {
    async fn create_application(&self, user_id: Uuid, fields: &ApplicationFields) -> PortResult<Application> {
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            user_id,
            fields: fields.clone(),
            resume: None,
            cover_letter: None,
            created_at: now,
            updated_at: now,
        };
        self.applications.lock().unwrap().push(application.clone());
        Ok(application)
    }

    async fn list_applications_by_user(&self, user_id: Uuid) -> PortResult<Vec<Application>> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application> {
        self.with_application(application_id, |a| a.clone())
    }

    async fn update_application(
        &self,
        application_id: Uuid,
        fields: &ApplicationFields,
    ) -> PortResult<Application> {
        self.with_application(application_id, |a| {
            a.fields = fields.clone();
            a.updated_at = Utc::now();
            a.clone()
        })
    }

    async fn set_document(
        &self,
        application_id: Uuid,
        slot: DocumentSlot,
        document: &DocumentRef,
    ) -> PortResult<Application> {
        self.with_application(application_id, |a| {
            match slot {
                DocumentSlot::Resume => a.resume = Some(document.clone()),
                DocumentSlot::CoverLetter => a.cover_letter = Some(document.clone()),
            }
            a.updated_at = Utc::now();
            a.clone()
        })
    }

    async fn delete_application(&self, application_id: Uuid) -> PortResult<()> {
        let mut applications = self.applications.lock().unwrap();
        let before = applications.len();
        applications.retain(|a| a.id != application_id);
        if applications.len() == before {
            return Err(PortError::NotFound(format!(
                "Application {} not found",
                application_id
            )));
        }
        Ok(())
    }
}

/// Hands out predictable URLs and records every call.
#[derive(Default)]
pub struct FakeStorage {
    pub puts: AtomicUsize,
    pub deleted: Mutex<Vec<String>>,
    pub fail_deletes: AtomicBool,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn put(&self, folder: &str, upload: &FileUpload) -> PortResult<DocumentRef> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        let storage_id = format!("{}/{}-{}", folder, n, upload.file_name);
        Ok(DocumentRef {
            url: format!("https://files.test/{}", storage_id),
            storage_id,
        })
    }

    async fn delete(&self, storage_id: &str) -> PortResult<()> {
        self.deleted.lock().unwrap().push(storage_id.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(PortError::ServiceUnavailable("storage is down".to_string()));
        }
        Ok(())
    }
}

/// Counts calls and echoes a fixed, padded reply.
#[derive(Default)]
pub struct CountingGenerator {
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl TextGenerationService for CountingGenerator {
    async fn generate_text(&self, prompt: &str, _max_tokens: u32) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok("  Generated text.\n".to_string())
    }
}

//=========================================================================================
// Harness
//=========================================================================================

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub storage: Arc<FakeStorage>,
    pub generator: Arc<CountingGenerator>,
    pub tokens: TokenIssuer,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        let storage = Arc::new(FakeStorage::default());
        let generator = Arc::new(CountingGenerator::default());
        let tokens = TokenIssuer::new(SECRET, Duration::hours(1));

        let state = Arc::new(AppState {
            credentials: store.clone(),
            applications: Arc::new(ApplicationService::new(
                store.clone(),
                storage.clone(),
                "job-tracker",
            )),
            ai: Arc::new(AiGateway::new(generator.clone())),
            tokens: tokens.clone(),
        });

        Self {
            router: router(state),
            store,
            storage,
            generator,
            tokens,
        }
    }

    /// Seeds a user directly in the store and returns its id and a valid token.
    pub async fn user(&self, name: &str) -> (Uuid, String) {
        let email = format!("{}@example.com", name.to_lowercase());
        let user = self
            .store
            .create_user(name, &email, "not-a-real-hash")
            .await
            .unwrap();
        let token = self.tokens.issue(user.user_id).unwrap();
        (user.user_id, token)
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

//=========================================================================================
// Request builders
//=========================================================================================

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

pub const BOUNDARY: &str = "job-tracker-test-boundary";

/// A multipart body with one part per `(field, file_name, content_type, bytes)`.
pub fn multipart_request(
    uri: &str,
    token: &str,
    parts: &[(&str, &str, &str, Vec<u8>)],
) -> Request<Body> {
    let mut body = Vec::new();
    for (field, file_name, content_type, bytes) in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body))
        .unwrap()
}
