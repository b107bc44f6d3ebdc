use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use adhdscreen_common::models::{ActivityAction, Gender, NewUser, Principal, User};
use adhdscreen_common::traits::UserRepository;
use crate::Error;
use crate::auth::{hash_password, verify_password, SessionStore};
use crate::services::ActivityLog;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email pattern compiles")
});

pub const MIN_PASSWORD_LEN: usize = 6;

const INVALID_LOGIN: &str = "Invalid email or password.";

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub struct AccountService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<SessionStore>,
    activity: ActivityLog,
}

impl AccountService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<SessionStore>, activity: ActivityLog) -> Self {
        Self { users, sessions, activity }
    }

    pub async fn register(&self, form: Registration) -> Result<i64, Error> {
        let name = form.name.trim().to_string();
        let email = normalize_email(&form.email);
        if name.is_empty() || email.is_empty() || form.password.is_empty() || form.confirm_password.is_empty() {
            return Err(Error::InvalidInput("Please fill in all required fields.".into()));
        }
        if !is_valid_email(&email) {
            return Err(Error::InvalidInput("Please enter a valid email address.".into()));
        }
        if form.password != form.confirm_password {
            return Err(Error::InvalidInput("Passwords do not match.".into()));
        }
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(Error::InvalidInput(format!(
                "Password must be at least {} characters.",
                MIN_PASSWORD_LEN
            )));
        }
        if let Some(age) = form.age {
            if !(0..=150).contains(&age) {
                return Err(Error::InvalidInput("Please enter a valid age.".into()));
            }
        }
        if self.users.get_by_email(&email).await?.is_some() {
            return Err(Error::Conflict("Email already exists.".into()));
        }

        let new_user = NewUser {
            name,
            email,
            password_hash: hash_password(&form.password)?,
            age: form.age,
            gender: form.gender.unwrap_or_default(),
            phone: form.phone.filter(|p| !p.trim().is_empty()),
            address: form.address.filter(|a| !a.trim().is_empty()),
        };
        let id = self.users.create(&new_user).await?;
        info!("Registered user {}", id);
        self.activity.record(id, ActivityAction::Register, None).await;
        Ok(id)
    }

    /// Opens a session for an active user with matching credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<(String, Principal), Error> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(Error::InvalidInput("Please fill in all fields.".into()));
        }
        if !is_valid_email(&email) {
            return Err(Error::InvalidInput("Please enter a valid email address.".into()));
        }

        let user = match self.users.get_by_email(&email).await? {
            Some(u) if u.is_active && verify_password(password, &u.password_hash) => u,
            _ => return Err(Error::Auth(INVALID_LOGIN.into())),
        };

        let principal = user.principal();
        let token = self.sessions.open(principal.clone())?;
        self.activity.record(principal.id, ActivityAction::Login, None).await;
        Ok((token, principal))
    }

    pub async fn logout(&self, token: &str) -> Option<Principal> {
        let principal = self.sessions.close(token)?;
        self.activity.record(principal.id, ActivityAction::Logout, None).await;
        Some(principal)
    }

    pub fn current_principal(&self, token: &str) -> Option<Principal> {
        self.sessions.current_principal(token)
    }

    pub async fn profile(&self, principal: &Principal) -> Result<User, Error> {
        self.users
            .get(principal.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("user {}", principal.id)))
    }

    pub async fn deactivate(&self, user_id: i64) -> Result<(), Error> {
        self.users.set_active(user_id, false).await?;
        self.sessions.close_all_for(user_id);
        self.activity.record(user_id, ActivityAction::Deactivate, None).await;
        Ok(())
    }

    /// Removes the user together with their results and activity log.
    pub async fn delete(&self, user_id: i64) -> Result<(), Error> {
        self.users.delete(user_id).await?;
        self.sessions.close_all_for(user_id);
        info!("Deleted user {}", user_id);
        Ok(())
    }
}
