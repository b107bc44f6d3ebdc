use std::sync::Arc;

use tracing::warn;

use adhdscreen_common::models::{ActivityAction, ActivityLogEntry, NewActivityLogEntry};
use adhdscreen_common::traits::ActivityLogRepository;
use crate::Error;

/// Best-effort audit trail. A failed write is logged and dropped; it never
/// fails the operation that triggered it.
#[derive(Clone)]
pub struct ActivityLog {
    repo: Arc<dyn ActivityLogRepository>,
}

impl ActivityLog {
    pub fn new(repo: Arc<dyn ActivityLogRepository>) -> Self {
        Self { repo }
    }

    /// Awaited in the caller's flow so one user's entries land in the order
    /// they happened.
    pub async fn record(&self, user_id: i64, action: ActivityAction, details: Option<&str>) {
        let entry = NewActivityLogEntry::new(user_id, action, details);
        if let Err(e) = self.repo.insert_entry(&entry).await {
            warn!(
                "Error logging activity '{}' for user {}: {}",
                action.as_str(), user_id, e
            );
        }
    }

    pub async fn recent(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>, Error> {
        self.repo.get_entries_for_user(user_id, limit).await
    }
}
