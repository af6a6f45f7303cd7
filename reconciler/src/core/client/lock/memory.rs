use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use super::{LockClient, LockError, LockInfo, LockResult};

/// Lock store for a single process. Expired entries are reclaimed on the next acquisition.
#[derive(Debug, Default)]
pub struct InMemoryLockClient {
    locks: Mutex<HashMap<String, LockInfo>>,
}

impl InMemoryLockClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LockClient for InMemoryLockClient {
    async fn acquire_lock_if_available(
        &self,
        key: &str,
        expiry_seconds: u64,
        owner: &str,
    ) -> Result<LockResult, LockError> {
        let ttl = i64::try_from(expiry_seconds).map_err(|_| LockError::InvalidExpiry(expiry_seconds))?;
        let now = Utc::now();
        let mut locks = self.locks.lock().await;

        if let Some(existing) = locks.get(key) {
            if !existing.is_expired(now) {
                return Ok(LockResult::AlreadyHeld(existing.owner.clone()));
            }
        }

        locks.insert(
            key.to_string(),
            LockInfo {
                _id: key.to_string(),
                owner: owner.to_string(),
                acquired_at: now,
                expires_at: now + Duration::seconds(ttl),
            },
        );
        Ok(LockResult::Acquired)
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError> {
        let mut locks = self.locks.lock().await;
        match locks.get(key) {
            Some(existing) if existing.owner == owner => {
                locks.remove(key);
                Ok(LockResult::Released)
            }
            _ => Ok(LockResult::NotFound),
        }
    }

    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError> {
        let now = Utc::now();
        let locks = self.locks.lock().await;
        Ok(locks.get(key).filter(|lock| !lock.is_expired(now)).map(|lock| lock.owner.clone()))
    }
}
