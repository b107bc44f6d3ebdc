use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action tags written to `user_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityAction {
    Register,
    Login,
    Logout,
    Prediction,
    Deactivate,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Register => "register",
            ActivityAction::Login => "login",
            ActivityAction::Logout => "logout",
            ActivityAction::Prediction => "prediction",
            ActivityAction::Deactivate => "deactivate",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: i64,
    pub action: String,
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLogEntry {
    pub user_id: i64,
    pub action: String,
    pub details: Option<String>,
}

impl NewActivityLogEntry {
    pub fn new(user_id: i64, action: ActivityAction, details: Option<&str>) -> Self {
        Self {
            user_id,
            action: action.as_str().to_string(),
            details: details.map(String::from),
        }
    }
}
