// File: adhdscreen-common/src/models/mod.rs
pub mod user;
pub mod result;
pub mod activity;
pub mod principal;

pub use user::{Gender, NewUser, User};
pub use result::{NewScreeningResult, RiskLevel, ScreeningResult};
pub use activity::{ActivityAction, ActivityLogEntry, NewActivityLogEntry};
pub use principal::Principal;
