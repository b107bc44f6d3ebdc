// ================================================================
// File: adhdscreen-common/src/error.rs
// ================================================================

use thiserror::Error;

/// Problems with the submitted questionnaire. Reported inline, never retried.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing feature: {0}")]
    MissingFeature(String),

    #[error("Invalid value for {name}: {raw}")]
    InvalidFeatureValue { name: String, raw: String },
}

impl ValidationError {
    /// The feature name the user has to fix.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::MissingFeature(name) => name,
            ValidationError::InvalidFeatureValue { name, .. } => name,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScoreError {
    /// Bundle never loaded. A feature-level outage, the rest of the service keeps running.
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Normalizer expects {expected} inputs, got {actual}")]
    NormalizerShapeMismatch { expected: usize, actual: usize },

    #[error("Classifier produced a non-finite output: {0}")]
    InvalidModelOutput(f64),

    /// Finite, but the percentage lands outside 0..=100.
    #[error("Classifier output {0} is outside the 0..1 confidence range")]
    OutputOutOfRange(f64),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found error: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// Transient storage outage; the whole request is safe to retry.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unknown owner: user {0} does not exist")]
    UnknownOwner(i64),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Data integrity error: {0}")]
    Integrity(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => Error::StoreUnavailable(err.to_string()),
            // 23505 => unique_violation
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                Error::Conflict(db_err.message().to_string())
            }
            _ => Error::Database(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_retryable_store_outage() {
        let err: Error = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }

    #[test]
    fn row_not_found_stays_a_database_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, Error::Database(_)));
    }

    #[test]
    fn validation_error_names_its_field() {
        let missing = ValidationError::MissingFeature("b".into());
        assert_eq!(missing.field(), "b");
        assert_eq!(missing.to_string(), "Missing feature: b");

        let invalid = ValidationError::InvalidFeatureValue { name: "a".into(), raw: "x".into() };
        assert_eq!(invalid.field(), "a");
        assert_eq!(invalid.to_string(), "Invalid value for a: x");
    }
}
