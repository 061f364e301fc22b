//! services/api/src/web/ai.rs
//!
//! Handlers for the AI writing helpers. Each one validates its body in the
//! core gateway before any call to the text-generation service.

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use job_tracker_core::{CoverLetterRequest, FitAnalysisRequest, FollowUpRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{ApiError, ErrorResponse};
use crate::web::dates;
use crate::web::rest::json_body;
use crate::web::state::{AppState, AuthContext};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterBody {
    pub job_description: Option<String>,
    pub company_name: Option<String>,
    pub position: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FitAnalysisBody {
    pub job_description: Option<String>,
    pub required_experience: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FollowUpBody {
    pub status: Option<String>,
    pub position: Option<String>,
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub application_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub follow_up_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "dates::deserialize")]
    pub interview_date: Option<DateTime<Utc>>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterResponse {
    pub cover_letter: String,
}

#[derive(Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub analysis: String,
}

#[derive(Serialize, ToSchema)]
pub struct SuggestionResponse {
    pub suggestion: String,
}

#[derive(Serialize, ToSchema)]
pub struct InsightsResponse {
    pub insights: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// Draft a cover letter for a role.
#[utoipa::path(
    post,
    path = "/api/ai/generate-cover-letter",
    request_body = CoverLetterBody,
    responses(
        (status = 200, description = "Draft cover letter", body = CoverLetterResponse),
        (status = 400, description = "Missing required fields", body = ErrorResponse),
        (status = 502, description = "Text generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn cover_letter_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<CoverLetterBody>, JsonRejection>,
) -> Result<Json<CoverLetterResponse>, ApiError> {
    let body = json_body(body)?;
    let request = CoverLetterRequest {
        job_description: body.job_description,
        company_name: body.company_name,
        position: body.position,
    };
    let cover_letter = state.ai.draft_cover_letter(&auth.name, &request).await?;
    Ok(Json(CoverLetterResponse { cover_letter }))
}

/// Analyze how an application fits its job description.
#[utoipa::path(
    post,
    path = "/api/ai/analyze-application",
    request_body = FitAnalysisBody,
    responses(
        (status = 200, description = "Fit analysis in Markdown", body = AnalysisResponse),
        (status = 400, description = "Missing job description", body = ErrorResponse),
        (status = 502, description = "Text generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn analyze_fit_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<FitAnalysisBody>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let body = json_body(body)?;
    let request = FitAnalysisRequest {
        job_description: body.job_description,
        required_experience: body.required_experience,
        keywords: body.keywords,
        notes: body.notes,
    };
    let analysis = state.ai.analyze_fit(&auth.name, &request).await?;
    Ok(Json(AnalysisResponse { analysis }))
}

/// Suggest the next follow-up step.
#[utoipa::path(
    post,
    path = "/api/ai/suggest-follow-up",
    request_body = FollowUpBody,
    responses(
        (status = 200, description = "Follow-up suggestion", body = SuggestionResponse),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 502, description = "Text generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn follow_up_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    body: Result<Json<FollowUpBody>, JsonRejection>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let body = json_body(body)?;
    let request = FollowUpRequest {
        status: body.status,
        position: body.position,
        company_name: body.company_name,
        application_date: body.application_date,
        follow_up_date: body.follow_up_date,
        interview_date: body.interview_date,
    };
    let suggestion = state.ai.suggest_follow_up(&auth.name, &request).await?;
    Ok(Json(SuggestionResponse { suggestion }))
}

/// Insights across all of the caller's applications.
#[utoipa::path(
    get,
    path = "/api/ai/success-insights",
    responses(
        (status = 200, description = "Insights", body = InsightsResponse),
        (status = 502, description = "Text generation failed", body = ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "AI"
)]
pub async fn success_insights_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<InsightsResponse>, ApiError> {
    let applications = state.applications.list(auth.user_id).await?;
    let insights = state.ai.success_insights(&auth.name, &applications).await?;
    Ok(Json(InsightsResponse { insights }))
}
