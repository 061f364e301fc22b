//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the application record endpoints and the
//! master definition for the OpenAPI specification.

use crate::error::{ApiError, ErrorResponse};
use crate::web::state::{AppState, AuthContext};
use crate::web::{ai, auth, dates};
use axum::{
    extract::{rejection::JsonRejection, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use job_tracker_core::{Application, ApplicationInput, DocumentSlot, FileUpload, PortError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, ToSchema};
use uuid::Uuid;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        create_application_handler,
        list_applications_handler,
        get_application_handler,
        update_application_handler,
        delete_application_handler,
        upload_documents_handler,
        ai::cover_letter_handler,
        ai::analyze_fit_handler,
        ai::follow_up_handler,
        ai::success_insights_handler,
    ),
    components(
        schemas(
            WelcomeResponse, ErrorResponse,
            auth::RegisterRequest, auth::LoginRequest, auth::AuthResponse, auth::UserResponse,
            ApplicationRequest, ApplicationResponse, DeleteResponse,
            ai::CoverLetterBody, ai::FitAnalysisBody, ai::FollowUpBody,
            ai::CoverLetterResponse, ai::AnalysisResponse, ai::SuggestionResponse, ai::InsightsResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Job Tracker API", description = "Track job applications, their documents, and AI writing help.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Body of create and update. Every field is optional here; create enforces
/// the required ones and update only touches what is supplied.
#[derive(Deserialize, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRequest {
    pub company_name: Option<String>,
    pub position: Option<String>,
    /// One of Wishlist, Applied, Screening, Interviewing, Offer Received, Rejected, Withdrawn.
    pub status: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub application_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub interview_date: Option<DateTime<Utc>>,
    pub application_link: Option<String>,
    pub application_method: Option<String>,
    pub required_experience: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl From<ApplicationRequest> for ApplicationInput {
    fn from(req: ApplicationRequest) -> Self {
        ApplicationInput {
            company_name: req.company_name,
            position: req.position,
            status: req.status,
            application_date: req.application_date,
            notes: req.notes,
            job_description: req.job_description,
            follow_up_date: req.follow_up_date,
            interview_date: req.interview_date,
            application_link: req.application_link,
            application_method: req.application_method,
            required_experience: req.required_experience,
            keywords: req.keywords,
        }
    }
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
    pub position: String,
    pub status: String,
    pub application_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub application_link: Option<String>,
    pub application_method: Option<String>,
    pub required_experience: Option<String>,
    pub keywords: Vec<String>,
    pub resume_url: Option<String>,
    pub resume_public_id: Option<String>,
    pub cover_letter_url: Option<String>,
    pub cover_letter_public_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Application> for ApplicationResponse {
    fn from(app: Application) -> Self {
        let (resume_url, resume_public_id) = match app.resume {
            Some(doc) => (Some(doc.url), Some(doc.storage_id)),
            None => (None, None),
        };
        let (cover_letter_url, cover_letter_public_id) = match app.cover_letter {
            Some(doc) => (Some(doc.url), Some(doc.storage_id)),
            None => (None, None),
        };
        let fields = app.fields;
        Self {
            id: app.id,
            user_id: app.user_id,
            company_name: fields.company_name,
            position: fields.position,
            status: fields.status.to_string(),
            application_date: fields.application_date,
            notes: fields.notes,
            job_description: fields.job_description,
            follow_up_date: fields.follow_up_date,
            interview_date: fields.interview_date,
            application_link: fields.application_link,
            application_method: fields.application_method,
            required_experience: fields.required_experience,
            keywords: fields.keywords,
            resume_url,
            resume_public_id,
            cover_letter_url,
            cover_letter_public_id,
            created_at: app.created_at,
            updated_at: app.updated_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DeleteResponse {
    pub message: String,
    pub id: Uuid,
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Unwraps a JSON body, reporting malformed input as a validation error.
pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::validation(rejection.body_text()))
}

/// An id that is not a UUID cannot name any record.
fn application_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::Port(PortError::NotFound(format!("Application {} not found", raw))))
}

fn upload_error(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::validation(format!("Failed to read uploaded files: {}", e.body_text()))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET /api - Welcome message
#[utoipa::path(
    get,
    path = "/api",
    responses((status = 200, description = "The API is up", body = WelcomeResponse)),
    tag = "Job Tracker API"
)]
pub async fn root_handler() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: "Welcome to the Job Tracker API".to_string(),
    })
}

/// Create a new application owned by the caller.
#[utoipa::path(
    post,
    path = "/api/applications",
    request_body = ApplicationRequest,
    responses(
        (status = 201, description = "Application created", body = ApplicationResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn create_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<ApplicationRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = json_body(body)?;
    let application = state.applications.create(auth.user_id, req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApplicationResponse::from(application))))
}

/// List the caller's applications, newest first.
#[utoipa::path(
    get,
    path = "/api/applications",
    responses(
        (status = 200, description = "The caller's applications", body = [ApplicationResponse]),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn list_applications_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    let applications = state.applications.list(auth.user_id).await?;
    Ok(Json(applications.into_iter().map(Into::into).collect()))
}

/// Fetch one application.
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "The application", body = ApplicationResponse),
        (status = 401, description = "Not the owner, or missing token", body = ErrorResponse),
        (status = 404, description = "No such application", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn get_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let application = state
        .applications
        .get(application_id(&id)?, auth.user_id)
        .await?;
    Ok(Json(application.into()))
}

/// Update the supplied fields of an application.
#[utoipa::path(
    put,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body = ApplicationRequest,
    responses(
        (status = 200, description = "The updated application", body = ApplicationResponse),
        (status = 400, description = "Invalid fields", body = ErrorResponse),
        (status = 401, description = "Not the owner, or missing token", body = ErrorResponse),
        (status = 404, description = "No such application", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn update_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    body: Result<Json<ApplicationRequest>, JsonRejection>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let id = application_id(&id)?;
    let req = json_body(body)?;
    let application = state
        .applications
        .update(id, auth.user_id, req.into())
        .await?;
    Ok(Json(application.into()))
}

/// Delete an application and, best effort, its stored documents.
#[utoipa::path(
    delete,
    path = "/api/applications/{id}",
    params(("id" = Uuid, Path, description = "Application id")),
    responses(
        (status = 200, description = "Application removed", body = DeleteResponse),
        (status = 401, description = "Not the owner, or missing token", body = ErrorResponse),
        (status = 404, description = "No such application", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn delete_application_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let id = state
        .applications
        .delete(application_id(&id)?, auth.user_id)
        .await?;
    Ok(Json(DeleteResponse {
        message: "Application removed".to_string(),
        id,
    }))
}

/// Attach a resume and/or cover letter.
///
/// Accepts multipart/form-data with file parts named `resume` and `coverLetter`.
/// Parts with other names are ignored. Each file must be a PDF, DOC, DOCX or
/// TXT of at most 10 MB.
#[utoipa::path(
    post,
    path = "/api/applications/{id}/upload",
    params(("id" = Uuid, Path, description = "Application id")),
    request_body(content_type = "multipart/form-data", description = "`resume` and/or `coverLetter` file parts."),
    responses(
        (status = 200, description = "The application with its new documents", body = ApplicationResponse),
        (status = 400, description = "No files, or a file of the wrong type or size", body = ErrorResponse),
        (status = 401, description = "Not the owner, or missing token", body = ErrorResponse),
        (status = 404, description = "No such application", body = ErrorResponse),
        (status = 502, description = "File storage failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "Applications"
)]
pub async fn upload_documents_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let id = application_id(&id)?;

    let mut uploads: Vec<(DocumentSlot, FileUpload)> = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let Some(slot) = field.name().and_then(DocumentSlot::from_field_name) else {
            debug!(field = ?field.name(), "Ignoring unrecognised multipart field");
            continue;
        };
        let file_name = field.file_name().unwrap_or("document").to_string();
        let content_type = field.content_type().map(str::to_string);
        let bytes: Bytes = field.bytes().await.map_err(upload_error)?;
        uploads.push((
            slot,
            FileUpload {
                file_name,
                content_type,
                bytes,
            },
        ));
    }

    let application = state
        .applications
        .upload_documents(id, auth.user_id, uploads)
        .await?;
    Ok(Json(application.into()))
}
