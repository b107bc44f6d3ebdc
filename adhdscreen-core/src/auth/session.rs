// src/auth/session.rs
//
// In-process session gate: opaque token -> authenticated principal.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine as _};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::rngs::OsRng;
use rand_core::TryRngCore;
use tracing::debug;

use adhdscreen_common::models::Principal;
use crate::Error;

pub const SESSION_COOKIE: &str = "adhd_session";

#[derive(Debug, Clone)]
struct Session {
    principal: Principal,
    last_access: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: DashMap<String, Session>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
        }
    }

    /// Starts a session and returns its token.
    pub fn open(&self, principal: Principal) -> Result<String, Error> {
        let token = new_token()?;
        debug!("opening session for user {}", principal.id);
        self.sessions.insert(
            token.clone(),
            Session {
                principal,
                last_access: Utc::now(),
            },
        );
        Ok(token)
    }

    /// Resolves a token. Idle sessions past the TTL are dropped on access.
    pub fn current_principal(&self, token: &str) -> Option<Principal> {
        let now = Utc::now();
        {
            let mut session = self.sessions.get_mut(token)?;
            if now.signed_duration_since(session.last_access) < self.ttl {
                session.last_access = now;
                return Some(session.principal.clone());
            }
        }
        debug!("session expired");
        self.sessions.remove(token);
        None
    }

    /// Ends a session, returning who it belonged to if it was still live.
    pub fn close(&self, token: &str) -> Option<Principal> {
        let (_, session) = self.sessions.remove(token)?;
        if Utc::now().signed_duration_since(session.last_access) < self.ttl {
            Some(session.principal)
        } else {
            None
        }
    }

    /// Drops every session belonging to `user_id` (deactivation, deletion).
    pub fn close_all_for(&self, user_id: i64) {
        self.sessions.retain(|_, s| s.principal.id != user_id);
    }

    pub fn prune(&self) {
        let now = Utc::now();
        self.sessions
            .retain(|_, s| now.signed_duration_since(s.last_access) < self.ttl);
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Test helper
    pub fn test_force_last_access(&self, token: &str, hours_ago: i64) -> bool {
        if let Some(mut entry) = self.sessions.get_mut(token) {
            entry.last_access = Utc::now() - Duration::hours(hours_ago);
            true
        } else {
            false
        }
    }
}

fn new_token() -> Result<String, Error> {
    let mut bytes = [0u8; 32];
    OsRng.try_fill_bytes(&mut bytes)
        .map_err(|e| Error::Auth(format!("token generation failed: {}", e)))?;
    Ok(BASE64.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal {
        Principal { id: 1, name: "Alice".into(), email: "alice@example.com".into() }
    }

    #[test]
    fn open_then_resolve() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.open(alice()).unwrap();
        assert_eq!(store.current_principal(&token), Some(alice()));
        assert_eq!(store.current_principal("bogus"), None);
    }

    #[test]
    fn idle_sessions_expire() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.open(alice()).unwrap();
        assert!(store.test_force_last_access(&token, 25));
        assert_eq!(store.current_principal(&token), None);
        assert!(store.is_empty());
    }

    #[test]
    fn close_returns_owner_once() {
        let store = SessionStore::new(Duration::hours(24));
        let token = store.open(alice()).unwrap();
        assert_eq!(store.close(&token), Some(alice()));
        assert_eq!(store.close(&token), None);
        assert_eq!(store.current_principal(&token), None);
    }

    #[test]
    fn close_all_for_user() {
        let store = SessionStore::new(Duration::hours(24));
        let a = store.open(alice()).unwrap();
        let b = store.open(Principal { id: 2, name: "Bob".into(), email: "bob@example.com".into() }).unwrap();
        store.close_all_for(1);
        assert_eq!(store.current_principal(&a), None);
        assert!(store.current_principal(&b).is_some());
    }

    #[test]
    fn tokens_are_unique() {
        let store = SessionStore::new(Duration::hours(1));
        assert_ne!(store.open(alice()).unwrap(), store.open(alice()).unwrap());
    }
}
