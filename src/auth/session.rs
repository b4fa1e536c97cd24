//! Persistence of issued token pairs, enabling revocation before expiry.
//!
//! Every login or refresh writes exactly one [`SessionRecord`]. Logout,
//! rotation, and revoke-all delete records; expiry is lazy, so readers must
//! treat stale records as absent rather than rely on a background sweep.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::models::SessionRecord;
use crate::error::StoreError;

/// Storage contract for session records.
///
/// `remove_by_refresh_token` is remove-and-return under one lock (or one
/// statement, for a database backend), which is what makes refresh rotation
/// strictly single-use.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError>;

    async fn find_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Delete the record holding this access token, returning it if it existed.
    async fn remove_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Atomically delete the record holding this refresh token.
    async fn remove_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Delete all records scoped to one `(user, device)` pair; returns the count.
    async fn remove_for_device(&self, user_id: &str, device_id: &str) -> Result<u64, StoreError>;

    /// Delete every record for a user; returns the count.
    async fn remove_for_user(&self, user_id: &str) -> Result<u64, StoreError>;
}

/// In-memory session store keyed by record id.
pub struct MemorySessionStore {
    records: Arc<RwLock<HashMap<String, SessionRecord>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of live (unexpired) records for a user. Test and admin helper.
    pub async fn live_count_for_user(&self, user_id: &str) -> usize {
        let now = Utc::now();
        let records = self.records.read().await;
        records
            .values()
            .filter(|r| r.user_id == user_id && r.refresh_expires_at > now)
            .count()
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn find_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let records = self.records.read().await;
        Ok(records
            .values()
            .find(|r| r.access_token == access_token)
            .cloned())
    }

    async fn remove_by_access_token(
        &self,
        access_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut records = self.records.write().await;
        let id = records
            .values()
            .find(|r| r.access_token == access_token)
            .map(|r| r.id.clone());
        Ok(id.and_then(|id| records.remove(&id)))
    }

    async fn remove_by_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let mut records = self.records.write().await;
        let id = records
            .values()
            .find(|r| r.refresh_token == refresh_token)
            .map(|r| r.id.clone());
        Ok(id.and_then(|id| records.remove(&id)))
    }

    async fn remove_for_device(&self, user_id: &str, device_id: &str) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| {
            !(r.user_id == user_id && r.device_id.as_deref() == Some(device_id))
        });
        Ok((before - records.len()) as u64)
    }

    async fn remove_for_user(&self, user_id: &str) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.user_id != user_id);
        Ok((before - records.len()) as u64)
    }
}
