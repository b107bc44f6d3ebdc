// src/repositories/memory.rs
//
// Non-durable store used by `--store memory` and by the service/HTTP tests.
// Mirrors the Postgres schema rules: unique email, owner must exist,
// deleting a user cascades to its results and log entries.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use adhdscreen_common::models::{
    ActivityLogEntry, NewActivityLogEntry, NewScreeningResult, NewUser, ScreeningResult, User,
};
use adhdscreen_common::traits::{ActivityLogRepository, ResultRepository, UserRepository};
use crate::Error;

#[derive(Default)]
struct Tables {
    next_id: i64,
    users: BTreeMap<i64, User>,
    results: BTreeMap<i64, ScreeningResult>,
    logs: BTreeMap<i64, ActivityLogEntry>,
}

impl Tables {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn require_owner(&self, user_id: i64) -> Result<(), Error> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(Error::UnknownOwner(user_id))
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `StoreUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), Error> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::StoreUnavailable("memory store is offline".into()));
        }
        Ok(())
    }

    pub async fn result_count(&self) -> usize {
        self.tables.lock().await.results.len()
    }

    pub async fn log_count(&self) -> usize {
        self.tables.lock().await.logs.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<i64, Error> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.email == user.email) {
            return Err(Error::Conflict(format!("email {} already registered", user.email)));
        }
        let id = t.allocate_id();
        let now = Utc::now();
        t.users.insert(id, User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            age: user.age,
            gender: user.gender,
            phone: user.phone.clone(),
            address: user.address.clone(),
            is_active: true,
            created_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Option<User>, Error> {
        self.check_online()?;
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.check_online()?;
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_active(&self, id: i64, is_active: bool) -> Result<(), Error> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        let user = t.users.get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("user {}", id)))?;
        user.is_active = is_active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<(), Error> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        if t.users.remove(&id).is_some() {
            t.results.retain(|_, r| r.user_id != id);
            t.logs.retain(|_, l| l.user_id != id);
        }
        Ok(())
    }
}

#[async_trait]
impl ResultRepository for MemoryStore {
    async fn create(&self, result: &NewScreeningResult) -> Result<i64, Error> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        t.require_owner(result.user_id)?;
        let id = t.allocate_id();
        t.results.insert(id, ScreeningResult {
            id,
            user_id: result.user_id,
            score: result.score,
            percentage: result.percentage,
            message: result.message.clone(),
            risk_level: result.risk_level,
            responses: result.responses.clone(),
            created_at: Utc::now(),
        });
        Ok(id)
    }

    async fn get(&self, result_id: i64, owner_id: i64) -> Result<Option<ScreeningResult>, Error> {
        self.check_online()?;
        let found = self.tables.lock().await.results.get(&result_id).cloned();
        let Some(result) = found else {
            return Ok(None);
        };
        let owner = result.user_id;
        let scoped = result.owned_by(owner_id);
        if scoped.is_none() {
            warn!(
                "result {} requested by user {} but owned by user {}",
                result_id, owner_id, owner
            );
        }
        Ok(scoped)
    }

    async fn list_recent(&self, owner_id: i64, limit: i64) -> Result<Vec<ScreeningResult>, Error> {
        self.check_online()?;
        let t = self.tables.lock().await;
        let mut rows: Vec<ScreeningResult> = t.results.values()
            .filter(|r| r.user_id == owner_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[async_trait]
impl ActivityLogRepository for MemoryStore {
    async fn insert_entry(&self, entry: &NewActivityLogEntry) -> Result<(), Error> {
        self.check_online()?;
        let mut t = self.tables.lock().await;
        t.require_owner(entry.user_id)?;
        let id = t.allocate_id();
        t.logs.insert(id, ActivityLogEntry {
            id,
            user_id: entry.user_id,
            action: entry.action.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn get_entries_for_user(&self, user_id: i64, limit: i64)
                                  -> Result<Vec<ActivityLogEntry>, Error>
    {
        self.check_online()?;
        let t = self.tables.lock().await;
        let mut rows: Vec<ActivityLogEntry> = t.logs.values()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        rows.truncate(limit.max(0) as usize);
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhdscreen_common::models::{ActivityAction, Gender, RiskLevel};
    use serde_json::json;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test User".into(),
            email: email.into(),
            password_hash: "hash".into(),
            age: Some(30),
            gender: Gender::Other,
            phone: None,
            address: None,
        }
    }

    fn new_result(user_id: i64, percentage: f64) -> NewScreeningResult {
        NewScreeningResult {
            user_id,
            score: percentage as i32,
            percentage,
            message: "m".into(),
            risk_level: RiskLevel::from_percentage(percentage),
            responses: json!({"a": "1"}),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() -> Result<(), Error> {
        let store = MemoryStore::new();
        UserRepository::create(&store, &new_user("a@example.com")).await?;
        let err = UserRepository::create(&store, &new_user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
        Ok(())
    }

    #[tokio::test]
    async fn writes_require_an_existing_owner() {
        let store = MemoryStore::new();
        let err = ResultRepository::create(&store, &new_result(99, 10.0)).await.unwrap_err();
        assert!(matches!(err, Error::UnknownOwner(99)));
        let err = store
            .insert_entry(&NewActivityLogEntry::new(99, ActivityAction::Login, None))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownOwner(99)));
    }

    #[tokio::test]
    async fn delete_cascades_to_results_and_logs() -> Result<(), Error> {
        let store = MemoryStore::new();
        let keep = UserRepository::create(&store, &new_user("keep@example.com")).await?;
        let gone = UserRepository::create(&store, &new_user("gone@example.com")).await?;
        ResultRepository::create(&store, &new_result(keep, 10.0)).await?;
        ResultRepository::create(&store, &new_result(gone, 20.0)).await?;
        store.insert_entry(&NewActivityLogEntry::new(gone, ActivityAction::Login, None)).await?;

        UserRepository::delete(&store, gone).await?;

        assert_eq!(store.result_count().await, 1);
        assert_eq!(store.log_count().await, 0);
        assert!(UserRepository::get(&store, gone).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryStore::new();
        store.set_offline(true);
        let err = ResultRepository::list_recent(&store, 1, 5).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
    }
}
