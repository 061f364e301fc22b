//! crates/job_tracker_core/src/ai.rs
//!
//! Builds natural-language prompts from application fields and forwards them
//! to the text-generation port. Every request is validated before anything
//! leaves the process. There are no retries and no caching.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

use crate::domain::{Application, ApplicationStatus};
use crate::ports::{PortError, PortResult, TextGenerationService};

const COVER_LETTER_MAX_TOKENS: u32 = 600;
const FIT_ANALYSIS_MAX_TOKENS: u32 = 700;
const FOLLOW_UP_MAX_TOKENS: u32 = 400;
const INSIGHTS_MAX_TOKENS: u32 = 500;

pub const NO_HISTORY_INSIGHTS: &str =
    "Start tracking your applications to unlock insights into your job search.";

//=========================================================================================
// Requests
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct CoverLetterRequest {
    pub job_description: Option<String>,
    pub company_name: Option<String>,
    pub position: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FitAnalysisRequest {
    pub job_description: Option<String>,
    pub required_experience: Option<String>,
    pub keywords: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct FollowUpRequest {
    pub status: Option<String>,
    pub position: Option<String>,
    pub company_name: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
}

//=========================================================================================
// Gateway
//=========================================================================================

pub struct AiGateway {
    generator: Arc<dyn TextGenerationService>,
}

impl AiGateway {
    pub fn new(generator: Arc<dyn TextGenerationService>) -> Self {
        Self { generator }
    }

    /// Drafts a cover letter for `applicant`.
    pub async fn draft_cover_letter(
        &self,
        applicant: &str,
        request: &CoverLetterRequest,
    ) -> PortResult<String> {
        let mut missing = Vec::new();
        let job_description = require(&request.job_description, "jobDescription", &mut missing);
        let company = require(&request.company_name, "companyName", &mut missing);
        let position = require(&request.position, "position", &mut missing);
        reject_missing(missing)?;

        let prompt = format!(
            "You are a career advisor drafting a cover letter on behalf of {applicant}.\n\
             Write a professional, engaging draft for the role of \"{position}\" at \"{company}\", \
             based on this job description:\n\
             <job_description>\n{job_description}\n</job_description>\n\n\
             - Open with a professional salutation and name the role.\n\
             - Pick two or three key requirements and show how the applicant could match them, \
             using placeholders such as [relevant experience] instead of inventing facts.\n\
             - Close with enthusiasm, a request for an interview, and a sign-off from {applicant}.\n\
             - Keep it between 250 and 350 words.\n\
             Respond with the letter text only."
        );

        self.generate(&prompt, COVER_LETTER_MAX_TOKENS).await
    }

    /// Analyzes how well an application lines up with its job description.
    pub async fn analyze_fit(
        &self,
        applicant: &str,
        request: &FitAnalysisRequest,
    ) -> PortResult<String> {
        let mut missing = Vec::new();
        let job_description = require(&request.job_description, "jobDescription", &mut missing);
        reject_missing(missing)?;

        let experience = present(&request.required_experience).unwrap_or("Not specified");
        let keywords = if request.keywords.is_empty() {
            "None provided".to_string()
        } else {
            request.keywords.join(", ")
        };
        let notes = present(&request.notes).unwrap_or("None provided");

        let prompt = format!(
            "You are helping {applicant} judge their fit for a job and sharpen their application.\n\
             <job_description>\n{job_description}\n</job_description>\n\
             Context from {applicant}:\n\
             - Required experience level: {experience}\n\
             - Keywords: {keywords}\n\
             - Notes: {notes}\n\n\
             Answer in Markdown with these sections:\n\
             1. Key requirements: the five to seven most important skills or duties.\n\
             2. Alignment and gaps: where the applicant likely fits and what they must address.\n\
             3. Tailoring suggestions: three to five concrete edits to the resume and cover letter.\n\
             4. Strategy tip: one short piece of advice for this kind of role.\n\
             Do not invent qualifications."
        );

        self.generate(&prompt, FIT_ANALYSIS_MAX_TOKENS).await
    }

    /// Suggests the next follow-up action for an application.
    pub async fn suggest_follow_up(
        &self,
        applicant: &str,
        request: &FollowUpRequest,
    ) -> PortResult<String> {
        let mut missing = Vec::new();
        let status = require(&request.status, "status", &mut missing);
        let position = require(&request.position, "position", &mut missing);
        let company = require(&request.company_name, "companyName", &mut missing);
        reject_missing(missing)?;
        let status: ApplicationStatus = status.parse()?;

        let applied = format_date(request.application_date);
        let follow_up = format_date(request.follow_up_date);
        let interview = format_date(request.interview_date);

        let prompt = format!(
            "You are advising {applicant} on following up on a job application.\n\
             - Position: {position}\n\
             - Company: {company}\n\
             - Status: {status}\n\
             - Applied on: {applied}\n\
             - Planned follow-up: {follow_up}\n\
             - Interview: {interview}\n\n\
             Using typical hiring timelines, reply with:\n\
             1. Action: the single next step (for example a short email, interview preparation, \
             a thank-you note, waiting, or moving on).\n\
             2. Timing: when to do it.\n\
             3. Message points: two or three bullets if the action involves writing to someone.\n\
             Fit the advice to the status: suggest applying for Wishlist, preparation when an \
             interview is scheduled, and a graceful close for Rejected, Withdrawn or Offer Received."
        );

        self.generate(&prompt, FOLLOW_UP_MAX_TOKENS).await
    }

    /// Summarizes patterns across all of an applicant's applications.
    ///
    /// An empty history returns a fixed message without calling the service.
    pub async fn success_insights(
        &self,
        applicant: &str,
        applications: &[Application],
    ) -> PortResult<String> {
        if applications.is_empty() {
            return Ok(NO_HISTORY_INSIGHTS.to_string());
        }

        let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
        let mut by_method: BTreeMap<&str, usize> = BTreeMap::new();
        for application in applications {
            *by_status.entry(application.fields.status.as_str()).or_default() += 1;
            let method = application
                .fields
                .application_method
                .as_deref()
                .unwrap_or("Unspecified");
            *by_method.entry(method).or_default() += 1;
        }

        let prompt = format!(
            "You are a career coach reviewing {applicant}'s job search of {total} applications.\n\
             Applications by status:\n{statuses}\n\
             Applications by method:\n{methods}\n\n\
             Give three short, practical insights about what seems to be working, what is not, \
             and what to try next. Base them only on these numbers.",
            total = applications.len(),
            statuses = tally(&by_status),
            methods = tally(&by_method),
        );

        self.generate(&prompt, INSIGHTS_MAX_TOKENS).await
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> PortResult<String> {
        debug!(prompt_len = prompt.len(), max_tokens, "Sending prompt to text generation");
        let text = self
            .generator
            .generate_text(prompt, max_tokens)
            .await
            .map_err(|e| {
                error!("Text generation failed: {}", e);
                match e {
                    PortError::ServiceUnavailable(_) => e,
                    other => PortError::ServiceUnavailable(format!("AI Service Error: {}", other)),
                }
            })?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PortError::ServiceUnavailable(
                "AI Service Error: received an empty response".to_string(),
            ));
        }
        Ok(trimmed.to_string())
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn require<'a>(value: &'a Option<String>, field: &'static str, missing: &mut Vec<&'static str>) -> &'a str {
    present(value).unwrap_or_else(|| {
        missing.push(field);
        ""
    })
}

fn reject_missing(missing: Vec<&'static str>) -> PortResult<()> {
    if missing.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

fn format_date(date: Option<DateTime<Utc>>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "N/A".to_string())
}

fn tally(counts: &BTreeMap<&str, usize>) -> String {
    counts
        .iter()
        .map(|(label, count)| format!("- {label}: {count}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ownership::tests::sample_application;
    use crate::ports::MockTextGenerationService;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn gateway(generator: MockTextGenerationService) -> AiGateway {
        AiGateway::new(Arc::new(generator))
    }

    #[tokio::test]
    async fn cover_letter_without_job_description_makes_no_call() {
        let mut generator = MockTextGenerationService::new();
        generator.expect_generate_text().times(0);

        let err = gateway(generator)
            .draft_cover_letter(
                "Ada",
                &CoverLetterRequest {
                    job_description: Some("   ".to_string()),
                    company_name: Some("Acme".to_string()),
                    position: Some("Engineer".to_string()),
                },
            )
            .await
            .unwrap_err();

        assert_eq!(
            err,
            PortError::Validation("Missing required fields: jobDescription".to_string())
        );
    }

    #[tokio::test]
    async fn cover_letter_prompt_carries_fields_and_output_is_trimmed() {
        let mut generator = MockTextGenerationService::new();
        generator
            .expect_generate_text()
            .withf(|prompt, max_tokens| {
                prompt.contains("Ada")
                    && prompt.contains("\"Engineer\" at \"Acme\"")
                    && prompt.contains("Build reliable services")
                    && *max_tokens == COVER_LETTER_MAX_TOKENS
            })
            .times(1)
            .returning(|_, _| Ok("\n  Dear Hiring Manager,\n...\n  ".to_string()));

        let letter = gateway(generator)
            .draft_cover_letter(
                "Ada",
                &CoverLetterRequest {
                    job_description: Some("Build reliable services".to_string()),
                    company_name: Some("Acme".to_string()),
                    position: Some("Engineer".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(letter, "Dear Hiring Manager,\n...");
    }

    #[tokio::test]
    async fn analysis_requires_only_job_description() {
        let mut generator = MockTextGenerationService::new();
        generator
            .expect_generate_text()
            .withf(|prompt, _| prompt.contains("Not specified") && prompt.contains("rust, sql"))
            .times(1)
            .returning(|_, _| Ok("analysis".to_string()));

        let analysis = gateway(generator)
            .analyze_fit(
                "Ada",
                &FitAnalysisRequest {
                    job_description: Some("Rust backend role".to_string()),
                    keywords: vec!["rust".to_string(), "sql".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(analysis, "analysis");
    }

    #[tokio::test]
    async fn follow_up_reports_every_missing_field() {
        let mut generator = MockTextGenerationService::new();
        generator.expect_generate_text().times(0);

        let err = gateway(generator)
            .suggest_follow_up("Ada", &FollowUpRequest::default())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PortError::Validation(
                "Missing required fields: status, position, companyName".to_string()
            )
        );
    }

    #[tokio::test]
    async fn follow_up_formats_dates() {
        let mut generator = MockTextGenerationService::new();
        generator
            .expect_generate_text()
            .withf(|prompt, _| {
                prompt.contains("Applied on: 2024-05-02")
                    && prompt.contains("Interview: N/A")
                    && prompt.contains("Status: Offer Received")
            })
            .times(1)
            .returning(|_, _| Ok("Send a thank-you note.".to_string()));

        let suggestion = gateway(generator)
            .suggest_follow_up(
                "Ada",
                &FollowUpRequest {
                    status: Some("Offer Received".to_string()),
                    position: Some("Engineer".to_string()),
                    company_name: Some("Acme".to_string()),
                    application_date: Some(Utc.with_ymd_and_hms(2024, 5, 2, 12, 0, 0).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(suggestion, "Send a thank-you note.");
    }

    #[tokio::test]
    async fn upstream_failure_is_service_unavailable() {
        let mut generator = MockTextGenerationService::new();
        generator
            .expect_generate_text()
            .times(1)
            .returning(|_, _| Err(PortError::Unexpected("rate limited".to_string())));

        let err = gateway(generator)
            .analyze_fit(
                "Ada",
                &FitAnalysisRequest {
                    job_description: Some("Rust backend role".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        let PortError::ServiceUnavailable(message) = err else {
            panic!("expected service unavailable");
        };
        assert!(message.contains("rate limited"));
    }

    #[tokio::test]
    async fn insights_without_history_skip_the_service() {
        let mut generator = MockTextGenerationService::new();
        generator.expect_generate_text().times(0);

        let insights = gateway(generator).success_insights("Ada", &[]).await.unwrap();
        assert_eq!(insights, NO_HISTORY_INSIGHTS);
    }

    #[tokio::test]
    async fn insights_prompt_tallies_statuses() {
        let owner = Uuid::new_v4();
        let mut rejected = sample_application(owner);
        rejected.fields.status = ApplicationStatus::Rejected;
        let history = vec![sample_application(owner), sample_application(owner), rejected];

        let mut generator = MockTextGenerationService::new();
        generator
            .expect_generate_text()
            .withf(|prompt, _| {
                prompt.contains("- Applied: 2")
                    && prompt.contains("- Rejected: 1")
                    && prompt.contains("- Unspecified: 3")
            })
            .times(1)
            .returning(|_, _| Ok("insights".to_string()));

        let insights = gateway(generator).success_insights("Ada", &history).await.unwrap();
        assert_eq!(insights, "insights");
    }
}
