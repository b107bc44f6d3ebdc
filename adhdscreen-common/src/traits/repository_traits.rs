use async_trait::async_trait;

use crate::error::Error;
use crate::models::{
    ActivityLogEntry, NewActivityLogEntry, NewScreeningResult, NewUser, ScreeningResult, User,
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user and returns the assigned id. Duplicate email => `Error::Conflict`.
    async fn create(&self, user: &NewUser) -> Result<i64, Error>;
    async fn get(&self, id: i64) -> Result<Option<User>, Error>;
    /// `email` must already be normalized (trimmed, lower-cased).
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, Error>;
    async fn set_active(&self, id: i64, is_active: bool) -> Result<(), Error>;
    /// Hard delete; cascades to the user's results and activity log.
    async fn delete(&self, id: i64) -> Result<(), Error>;
}

/// The result ledger. Append-only: there is no update path.
#[async_trait]
pub trait ResultRepository: Send + Sync {
    async fn create(&self, result: &NewScreeningResult) -> Result<i64, Error>;

    /// Returns `None` both when the id does not exist and when it belongs
    /// to someone other than `owner_id`.
    async fn get(&self, result_id: i64, owner_id: i64) -> Result<Option<ScreeningResult>, Error>;

    /// Newest first, ties broken by id (newest first).
    async fn list_recent(&self, owner_id: i64, limit: i64) -> Result<Vec<ScreeningResult>, Error>;
}

/// Append-only audit trail.
#[async_trait]
pub trait ActivityLogRepository: Send + Sync {
    async fn insert_entry(&self, entry: &NewActivityLogEntry) -> Result<(), Error>;
    /// Newest first.
    async fn get_entries_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<ActivityLogEntry>, Error>;
}
