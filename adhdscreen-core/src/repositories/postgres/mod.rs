// src/repositories/postgres/mod.rs

use crate::Error;

pub mod user;
pub mod results;
pub mod user_logs;

pub use user::PostgresUserRepository;
pub use results::PostgresResultRepository;
pub use user_logs::PostgresActivityLogRepository;

/// Maps a foreign-key violation (23503) on an owner column to `UnknownOwner`.
pub(crate) fn owner_violation(err: sqlx::Error, owner_id: i64) -> Error {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some("23503") {
            return Error::UnknownOwner(owner_id);
        }
    }
    Error::from(err)
}
