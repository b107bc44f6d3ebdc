pub mod activity_log;
pub mod screening_service;
pub mod account_service;

pub use activity_log::ActivityLog;
pub use screening_service::{ScreeningService, SubmissionOutcome};
pub use account_service::{AccountService, Registration};
