//! crates/job_tracker_core/src/ownership.rs
//!
//! The ownership guard that runs in front of every record-scoped operation.

use tracing::warn;
use uuid::Uuid;

use crate::domain::Application;
use crate::ports::{ApplicationStore, PortError, PortResult};

/// Loads an application and checks that `requester` owns it.
///
/// On success the loaded record is handed back so the caller does not need a
/// second lookup. On mismatch nothing is mutated and the error carries no
/// record data.
pub async fn authorize(
    store: &dyn ApplicationStore,
    application_id: Uuid,
    requester: Uuid,
) -> PortResult<Application> {
    let application = store.get_application_by_id(application_id).await?;

    if application.user_id != requester {
        warn!(
            application_id = %application_id,
            requester = %requester,
            "Rejected access to an application owned by another user"
        );
        return Err(PortError::Unauthorized(
            "User not authorized to access this application".to_string(),
        ));
    }

    Ok(application)
}
