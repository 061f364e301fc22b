//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `CredentialStore` and `ApplicationStore` ports from the `core` crate. It
//! handles all interactions with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use job_tracker_core::domain::{
    Application, ApplicationFields, ApplicationStatus, DocumentRef, DocumentSlot, User,
    UserCredentials,
};
use job_tracker_core::ports::{ApplicationStore, CredentialStore, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

const APPLICATION_COLUMNS: &str = "id, user_id, company_name, position, status, application_date, \
     notes, job_description, follow_up_date, interview_date, application_link, application_method, \
     required_experience, keywords, resume_url, resume_public_id, cover_letter_url, \
     cover_letter_public_id, created_at, updated_at";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the persistence ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn application_not_found(application_id: Uuid) -> PortError {
    PortError::NotFound(format!("Application {} not found", application_id))
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    user_id: Uuid,
    name: String,
    email: String,
    hashed_password: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                user_id: self.user_id,
                name: self.name,
                email: self.email,
                created_at: self.created_at,
            },
            hashed_password: self.hashed_password,
        }
    }
}

#[derive(FromRow)]
struct ApplicationRecord {
    id: Uuid,
    user_id: Uuid,
    company_name: String,
    position: String,
    status: String,
    application_date: DateTime<Utc>,
    notes: Option<String>,
    job_description: Option<String>,
    follow_up_date: Option<DateTime<Utc>>,
    interview_date: Option<DateTime<Utc>>,
    application_link: Option<String>,
    application_method: Option<String>,
    required_experience: Option<String>,
    keywords: Vec<String>,
    resume_url: Option<String>,
    resume_public_id: Option<String>,
    cover_letter_url: Option<String>,
    cover_letter_public_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ApplicationRecord {
    fn to_domain(self) -> PortResult<Application> {
        let status = self.status.parse::<ApplicationStatus>().map_err(|_| {
            PortError::Unexpected(format!(
                "Application {} has unknown stored status '{}'",
                self.id, self.status
            ))
        })?;

        Ok(Application {
            id: self.id,
            user_id: self.user_id,
            fields: ApplicationFields {
                company_name: self.company_name,
                position: self.position,
                status,
                application_date: self.application_date,
                notes: self.notes,
                job_description: self.job_description,
                follow_up_date: self.follow_up_date,
                interview_date: self.interview_date,
                application_link: self.application_link,
                application_method: self.application_method,
                required_experience: self.required_experience,
                keywords: self.keywords,
            },
            resume: document_ref(self.resume_url, self.resume_public_id),
            cover_letter: document_ref(self.cover_letter_url, self.cover_letter_public_id),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// The table constraints keep both columns set or both NULL.
fn document_ref(url: Option<String>, storage_id: Option<String>) -> Option<DocumentRef> {
    match (url, storage_id) {
        (Some(url), Some(storage_id)) => Some(DocumentRef { url, storage_id }),
        _ => None,
    }
}

//=========================================================================================
// `CredentialStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialStore for DbAdapter {
    async fn create_user(&self, name: &str, email: &str, hashed_password: &str) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (user_id, name, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING user_id, name, email, hashed_password, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                PortError::Conflict("User already exists".to_string())
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain().user)
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email, hashed_password, created_at FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User with email {} not found", email)))?;

        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT user_id, name, email, hashed_password, created_at FROM users WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))?;

        Ok(record.to_domain().user)
    }
}

//=========================================================================================
// `ApplicationStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ApplicationStore for DbAdapter {
    async fn create_application(&self, user_id: Uuid, fields: &ApplicationFields) -> PortResult<Application> {
        let sql = format!(
            "INSERT INTO applications (id, user_id, company_name, position, status, application_date, \
             notes, job_description, follow_up_date, interview_date, application_link, \
             application_method, required_experience, keywords) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) \
             RETURNING {}",
            APPLICATION_COLUMNS
        );
        let record = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&fields.company_name)
            .bind(&fields.position)
            .bind(fields.status.as_str())
            .bind(fields.application_date)
            .bind(&fields.notes)
            .bind(&fields.job_description)
            .bind(fields.follow_up_date)
            .bind(fields.interview_date)
            .bind(&fields.application_link)
            .bind(&fields.application_method)
            .bind(&fields.required_experience)
            .bind(&fields.keywords)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;

        record.to_domain()
    }

    async fn list_applications_by_user(&self, user_id: Uuid) -> PortResult<Vec<Application>> {
        let sql = format!(
            "SELECT {} FROM applications WHERE user_id = $1 ORDER BY created_at DESC",
            APPLICATION_COLUMNS
        );
        let records = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_application_by_id(&self, application_id: Uuid) -> PortResult<Application> {
        let sql = format!("SELECT {} FROM applications WHERE id = $1", APPLICATION_COLUMNS);
        sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(application_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| application_not_found(application_id))?
            .to_domain()
    }

    async fn update_application(
        &self,
        application_id: Uuid,
        fields: &ApplicationFields,
    ) -> PortResult<Application> {
        let sql = format!(
            "UPDATE applications SET company_name = $2, position = $3, status = $4, \
             application_date = $5, notes = $6, job_description = $7, follow_up_date = $8, \
             interview_date = $9, application_link = $10, application_method = $11, \
             required_experience = $12, keywords = $13, updated_at = NOW() \
             WHERE id = $1 RETURNING {}",
            APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(application_id)
            .bind(&fields.company_name)
            .bind(&fields.position)
            .bind(fields.status.as_str())
            .bind(fields.application_date)
            .bind(&fields.notes)
            .bind(&fields.job_description)
            .bind(fields.follow_up_date)
            .bind(fields.interview_date)
            .bind(&fields.application_link)
            .bind(&fields.application_method)
            .bind(&fields.required_experience)
            .bind(&fields.keywords)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| application_not_found(application_id))?
            .to_domain()
    }

    async fn set_document(
        &self,
        application_id: Uuid,
        slot: DocumentSlot,
        document: &DocumentRef,
    ) -> PortResult<Application> {
        let (url_column, id_column) = match slot {
            DocumentSlot::Resume => ("resume_url", "resume_public_id"),
            DocumentSlot::CoverLetter => ("cover_letter_url", "cover_letter_public_id"),
        };
        let sql = format!(
            "UPDATE applications SET {} = $2, {} = $3, updated_at = NOW() WHERE id = $1 RETURNING {}",
            url_column, id_column, APPLICATION_COLUMNS
        );
        sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(application_id)
            .bind(&document.url)
            .bind(&document.storage_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| application_not_found(application_id))?
            .to_domain()
    }

    async fn delete_application(&self, application_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(application_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(application_not_found(application_id));
        }
        Ok(())
    }
}
