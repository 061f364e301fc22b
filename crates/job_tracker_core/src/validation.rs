//! crates/job_tracker_core/src/validation.rs
//!
//! Input schemas for every write path. Nothing reaches a port until it has
//! passed through one of these functions.

use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

use crate::domain::{ApplicationFields, ApplicationInput, ApplicationStatus, FileUpload};
use crate::ports::{PortError, PortResult};

/// Largest accepted document upload.
pub const MAX_DOCUMENT_BYTES: usize = 10 * 1024 * 1024;

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Accepted document types as (extension, MIME type) pairs.
const ALLOWED_DOCUMENT_TYPES: [(&str, &str); 4] = [
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
];

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[A-Za-z]{2,}$").expect("email pattern is valid")
    })
}

fn link_regex() -> &'static Regex {
    static LINK: OnceLock<Regex> = OnceLock::new();
    LINK.get_or_init(|| {
        Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("link pattern is valid")
    })
}

//=========================================================================================
// Applications
//=========================================================================================

/// Validates a creation request, filling in defaults for omitted fields.
pub fn validate_new_application(
    input: ApplicationInput,
    now: DateTime<Utc>,
) -> PortResult<ApplicationFields> {
    let mut errors = Vec::new();

    let company_name = required_text(input.company_name, "Company name is required", &mut errors);
    let position = required_text(input.position, "Position is required", &mut errors);

    let status = match input.status.as_deref().map(str::trim) {
        None => ApplicationStatus::default(),
        Some(raw) => raw.parse().unwrap_or_else(|e: PortError| {
            errors.push(e.to_string());
            ApplicationStatus::default()
        }),
    };

    let application_link = optional_text(input.application_link);
    if let Some(link) = &application_link {
        if !link_regex().is_match(link) {
            errors.push("Please provide a valid URL".to_string());
        }
    }

    if !errors.is_empty() {
        return Err(PortError::Validation(errors.join(", ")));
    }

    Ok(ApplicationFields {
        company_name,
        position,
        status,
        application_date: input.application_date.unwrap_or(now),
        notes: optional_text(input.notes),
        job_description: optional_text(input.job_description),
        follow_up_date: input.follow_up_date,
        interview_date: input.interview_date,
        application_link,
        application_method: optional_text(input.application_method),
        required_experience: optional_text(input.required_experience),
        keywords: clean_keywords(input.keywords.unwrap_or_default()),
    })
}

/// Merges a partial update into the current fields and re-runs creation validation.
pub fn validate_application_changes(
    current: &ApplicationFields,
    changes: ApplicationInput,
) -> PortResult<ApplicationFields> {
    let merged = ApplicationInput::from(current).overlay(changes);
    validate_new_application(merged, current.application_date)
}

fn required_text(value: Option<String>, message: &str, errors: &mut Vec<String>) -> String {
    match optional_text(value) {
        Some(text) => text,
        None => {
            errors.push(message.to_string());
            String::new()
        }
    }
}

/// Trims, mapping blank strings to `None`.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn clean_keywords(keywords: Vec<String>) -> Vec<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
        .collect()
}

//=========================================================================================
// Documents
//=========================================================================================

/// Checks a document against the type allow-list and the size cap.
pub fn validate_document(upload: &FileUpload) -> PortResult<()> {
    if upload.bytes.len() > MAX_DOCUMENT_BYTES {
        return Err(PortError::Validation(format!(
            "File '{}' exceeds the {} MB limit",
            upload.file_name,
            MAX_DOCUMENT_BYTES / (1024 * 1024)
        )));
    }

    let extension = upload
        .file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    let Some((_, expected_mime)) = ALLOWED_DOCUMENT_TYPES
        .iter()
        .find(|(ext, _)| *ext == extension)
    else {
        return Err(PortError::Validation(format!(
            "File '{}' has an unsupported type. Only PDF, DOC, DOCX and TXT files are accepted",
            upload.file_name
        )));
    };

    // A missing or generic content type is inferred from the extension.
    if let Some(content_type) = &upload.content_type {
        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        if mime != *expected_mime && mime != "application/octet-stream" {
            return Err(PortError::Validation(format!(
                "File '{}' has content type '{}', which does not match its extension",
                upload.file_name, content_type
            )));
        }
    }

    Ok(())
}

//=========================================================================================
// Users
//=========================================================================================

pub fn validate_registration(name: &str, email: &str, password: &str) -> PortResult<()> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }
    if !email_regex().is_match(email.trim()) {
        errors.push("Please include a valid email".to_string());
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        errors.push(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(PortError::Validation(errors.join(", ")))
    }
}

/// Emails are compared case-insensitively and stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use chrono::TimeZone;

    fn input(company: &str, position: &str) -> ApplicationInput {
        ApplicationInput {
            company_name: Some(company.to_string()),
            position: Some(position.to_string()),
            ..Default::default()
        }
    }

    fn upload(name: &str, content_type: Option<&str>, len: usize) -> FileUpload {
        FileUpload {
            file_name: name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes: Bytes::from(vec![0u8; len]),
        }
    }

    #[test]
    fn new_application_gets_defaults() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let fields = validate_new_application(input("  Acme ", "Engineer"), now).unwrap();

        assert_eq!(fields.company_name, "Acme");
        assert_eq!(fields.status, ApplicationStatus::Applied);
        assert_eq!(fields.application_date, now);
        assert!(fields.keywords.is_empty());
        assert_eq!(fields.notes, None);
    }

    #[test]
    fn missing_required_fields_are_all_reported() {
        let err = validate_new_application(ApplicationInput::default(), Utc::now()).unwrap_err();
        let PortError::Validation(message) = err else {
            panic!("expected validation error");
        };
        assert!(message.contains("Company name is required"));
        assert!(message.contains("Position is required"));
    }

    #[test]
    fn blank_required_field_is_rejected() {
        assert!(validate_new_application(input("   ", "Engineer"), Utc::now()).is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut raw = input("Acme", "Engineer");
        raw.status = Some("NotARealStatus".to_string());
        assert!(matches!(
            validate_new_application(raw, Utc::now()),
            Err(PortError::Validation(_))
        ));
    }

    #[test]
    fn application_link_must_be_http_url() {
        let mut raw = input("Acme", "Engineer");
        raw.application_link = Some("not a url".to_string());
        assert!(validate_new_application(raw.clone(), Utc::now()).is_err());

        raw.application_link = Some("https://jobs.acme.example/123".to_string());
        assert!(validate_new_application(raw, Utc::now()).is_ok());
    }

    #[test]
    fn keywords_keep_order_and_duplicates_but_drop_blanks() {
        let mut raw = input("Acme", "Engineer");
        raw.keywords = Some(vec![
            " rust ".to_string(),
            "".to_string(),
            "sql".to_string(),
            "rust".to_string(),
        ]);
        let fields = validate_new_application(raw, Utc::now()).unwrap();
        assert_eq!(fields.keywords, vec!["rust", "sql", "rust"]);
    }

    #[test]
    fn changes_leave_unsupplied_fields_alone() {
        let mut raw = input("Acme", "Engineer");
        raw.notes = Some("referral from Sam".to_string());
        let current = validate_new_application(raw, Utc::now()).unwrap();

        let updated = validate_application_changes(
            &current,
            ApplicationInput {
                status: Some("Interviewing".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.status, ApplicationStatus::Interviewing);
        assert_eq!(updated.notes.as_deref(), Some("referral from Sam"));
        assert_eq!(updated.application_date, current.application_date);
        assert_eq!(updated.company_name, "Acme");
    }

    #[test]
    fn changes_can_clear_optional_text() {
        let mut raw = input("Acme", "Engineer");
        raw.notes = Some("stale".to_string());
        let current = validate_new_application(raw, Utc::now()).unwrap();

        let updated = validate_application_changes(
            &current,
            ApplicationInput {
                notes: Some(String::new()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(updated.notes, None);
    }

    #[test]
    fn documents_within_limits_are_accepted() {
        assert!(validate_document(&upload("cv.pdf", Some("application/pdf"), 1024)).is_ok());
        assert!(validate_document(&upload("CV.DOCX", None, 10)).is_ok());
        assert!(validate_document(&upload("notes.txt", Some("text/plain; charset=utf-8"), 10)).is_ok());
        assert!(validate_document(&upload("max.pdf", None, MAX_DOCUMENT_BYTES)).is_ok());
    }

    #[test]
    fn oversized_document_is_rejected() {
        let err = validate_document(&upload("big.pdf", Some("application/pdf"), 15 * 1024 * 1024))
            .unwrap_err();
        assert!(matches!(err, PortError::Validation(_)));
    }

    #[test]
    fn disallowed_document_types_are_rejected() {
        assert!(validate_document(&upload("photo.png", Some("image/png"), 10)).is_err());
        assert!(validate_document(&upload("no_extension", None, 10)).is_err());
        assert!(validate_document(&upload("cv.pdf", Some("image/png"), 10)).is_err());
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration("Ada", "ada@example.com", "secret1").is_ok());
        assert!(validate_registration("", "ada@example.com", "secret1").is_err());
        assert!(validate_registration("Ada", "ada-at-example", "secret1").is_err());
        assert!(validate_registration("Ada", "ada@example.com", "123").is_err());
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
