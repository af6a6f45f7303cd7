pub mod error;
pub mod memory;
pub mod mongodb;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ::mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};

pub use error::LockError;
pub use memory::InMemoryLockClient;
pub use self::mongodb::MongoLockClient;

/// A held lock: who owns it and when it lapses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LockInfo {
    pub _id: String,
    pub owner: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub acquired_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
}

impl LockInfo {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// What a lease store call did.
#[derive(Debug, Clone, PartialEq)]
pub enum LockResult {
    Acquired,
    /// Someone else holds the key; carries their token.
    AlreadyHeld(String),
    Released,
    NotFound,
}

/// Shared lock store with create-if-absent semantics. Acquisition never waits.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LockClient: Send + Sync {
    /// Acquire the lock if nobody holds it (expired holders do not count).
    async fn acquire_lock_if_available(
        &self,
        key: &str,
        expiry_seconds: u64,
        owner: &str,
    ) -> Result<LockResult, LockError>;

    /// Delete the lease only while `owner` still holds it. Someone else's lease yields `NotFound`.
    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError>;

    /// Token of the live holder, if any.
    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError>;

    async fn is_locked(&self, key: &str) -> Result<bool, LockError> {
        Ok(self.get_lock_owner(key).await?.is_some())
    }
}
