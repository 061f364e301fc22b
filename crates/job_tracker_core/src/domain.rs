//! crates/job_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::ports::PortError;

// Represents a user - used throughout app
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login/signup - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub hashed_password: String,
}

//=========================================================================================
// Application Status
//=========================================================================================

/// The pipeline stage of a tracked job application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ApplicationStatus {
    Wishlist,
    #[default]
    Applied,
    Screening,
    Interviewing,
    OfferReceived,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 7] = [
        ApplicationStatus::Wishlist,
        ApplicationStatus::Applied,
        ApplicationStatus::Screening,
        ApplicationStatus::Interviewing,
        ApplicationStatus::OfferReceived,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    /// The canonical label, which is also the wire and storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Wishlist => "Wishlist",
            ApplicationStatus::Applied => "Applied",
            ApplicationStatus::Screening => "Screening",
            ApplicationStatus::Interviewing => "Interviewing",
            ApplicationStatus::OfferReceived => "Offer Received",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Withdrawn => "Withdrawn",
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApplicationStatus {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = ApplicationStatus::ALL.iter().map(|s| s.as_str()).collect();
                PortError::Validation(format!(
                    "Invalid status '{}'. Must be one of: {}",
                    s,
                    allowed.join(", ")
                ))
            })
    }
}

//=========================================================================================
// Documents
//=========================================================================================

/// One of the two document positions on an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentSlot {
    Resume,
    CoverLetter,
}

impl DocumentSlot {
    /// The multipart field name a client uses for this slot.
    pub fn field_name(&self) -> &'static str {
        match self {
            DocumentSlot::Resume => "resume",
            DocumentSlot::CoverLetter => "coverLetter",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        match name {
            "resume" => Some(DocumentSlot::Resume),
            "coverLetter" => Some(DocumentSlot::CoverLetter),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// A stored remote object: where to fetch it and the handle needed to delete it.
/// The two halves only ever travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub url: String,
    pub storage_id: String,
}

/// A file received from a client, not yet validated.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

//=========================================================================================
// Applications
//=========================================================================================

/// The validated, owner-editable fields of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationFields {
    pub company_name: String,
    pub position: String,
    pub status: ApplicationStatus,
    pub application_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub application_link: Option<String>,
    pub application_method: Option<String>,
    pub required_experience: Option<String>,
    pub keywords: Vec<String>,
}

/// A tracked job application owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Application {
    pub id: Uuid,
    pub user_id: Uuid,
    pub fields: ApplicationFields,
    pub resume: Option<DocumentRef>,
    pub cover_letter: Option<DocumentRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Application {
    pub fn document(&self, slot: DocumentSlot) -> Option<&DocumentRef> {
        match slot {
            DocumentSlot::Resume => self.resume.as_ref(),
            DocumentSlot::CoverLetter => self.cover_letter.as_ref(),
        }
    }

    /// All populated document slots.
    pub fn documents(&self) -> impl Iterator<Item = (DocumentSlot, &DocumentRef)> {
        [DocumentSlot::Resume, DocumentSlot::CoverLetter]
            .into_iter()
            .filter_map(move |slot| self.document(slot).map(|doc| (slot, doc)))
    }
}

/// Unvalidated application fields as submitted by a client.
///
/// Used for both creation and partial updates: a `None` means "not supplied".
#[derive(Debug, Clone, Default)]
pub struct ApplicationInput {
    pub company_name: Option<String>,
    pub position: Option<String>,
    pub status: Option<String>,
    pub application_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub job_description: Option<String>,
    pub follow_up_date: Option<DateTime<Utc>>,
    pub interview_date: Option<DateTime<Utc>>,
    pub application_link: Option<String>,
    pub application_method: Option<String>,
    pub required_experience: Option<String>,
    pub keywords: Option<Vec<String>>,
}

impl ApplicationInput {
    /// Layers `changes` on top of `self`; supplied fields win.
    pub fn overlay(self, changes: ApplicationInput) -> ApplicationInput {
        ApplicationInput {
            company_name: changes.company_name.or(self.company_name),
            position: changes.position.or(self.position),
            status: changes.status.or(self.status),
            application_date: changes.application_date.or(self.application_date),
            notes: changes.notes.or(self.notes),
            job_description: changes.job_description.or(self.job_description),
            follow_up_date: changes.follow_up_date.or(self.follow_up_date),
            interview_date: changes.interview_date.or(self.interview_date),
            application_link: changes.application_link.or(self.application_link),
            application_method: changes.application_method.or(self.application_method),
            required_experience: changes.required_experience.or(self.required_experience),
            keywords: changes.keywords.or(self.keywords),
        }
    }
}

impl From<&ApplicationFields> for ApplicationInput {
    fn from(fields: &ApplicationFields) -> Self {
        Self {
            company_name: Some(fields.company_name.clone()),
            position: Some(fields.position.clone()),
            status: Some(fields.status.as_str().to_string()),
            application_date: Some(fields.application_date),
            notes: fields.notes.clone(),
            job_description: fields.job_description.clone(),
            follow_up_date: fields.follow_up_date,
            interview_date: fields.interview_date,
            application_link: fields.application_link.clone(),
            application_method: fields.application_method.clone(),
            required_experience: fields.required_experience.clone(),
            keywords: Some(fields.keywords.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_its_own_labels() {
        for status in ApplicationStatus::ALL {
            assert_eq!(status.as_str().parse::<ApplicationStatus>().unwrap(), status);
        }
        assert_eq!(ApplicationStatus::default(), ApplicationStatus::Applied);
    }

    #[test]
    fn status_rejects_unknown_and_differently_cased_labels() {
        assert!(matches!(
            "NotARealStatus".parse::<ApplicationStatus>(),
            Err(PortError::Validation(_))
        ));
        assert!("offer received".parse::<ApplicationStatus>().is_err());
    }

    #[test]
    fn overlay_keeps_unsupplied_fields() {
        let base = ApplicationInput {
            company_name: Some("Acme".to_string()),
            position: Some("Engineer".to_string()),
            notes: Some("first call went well".to_string()),
            ..Default::default()
        };
        let merged = base.overlay(ApplicationInput {
            position: Some("Staff Engineer".to_string()),
            ..Default::default()
        });

        assert_eq!(merged.company_name.as_deref(), Some("Acme"));
        assert_eq!(merged.position.as_deref(), Some("Staff Engineer"));
        assert_eq!(merged.notes.as_deref(), Some("first call went well"));
    }

    #[test]
    fn slots_round_trip_through_field_names() {
        assert_eq!(DocumentSlot::from_field_name("resume"), Some(DocumentSlot::Resume));
        assert_eq!(
            DocumentSlot::from_field_name(DocumentSlot::CoverLetter.field_name()),
            Some(DocumentSlot::CoverLetter)
        );
        assert_eq!(DocumentSlot::from_field_name("photo"), None);
    }
}
