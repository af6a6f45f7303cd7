use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use mongodb::bson::{doc, DateTime as BsonDateTime, Document};
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use tracing::debug;

use super::{LockClient, LockError, LockInfo, LockResult};
use crate::core::client::database::constant::TRACE_LEASE_TTL_INDEX;
use crate::core::client::database::mongo_client::helpers::record_metrics;
use crate::core::client::database::mongo_client::MongoClient;
use crate::core::client::database::DatabaseError;

/// Lock store in a MongoDB collection keyed by `_id`, so a second insert for a held key fails atomically.
pub struct MongoLockClient {
    client: Arc<MongoClient>,
}

impl MongoLockClient {
    pub fn new(client: Arc<MongoClient>) -> Self {
        Self { client }
    }

    /// Lets MongoDB sweep leases whose holder crashed.
    pub async fn create_indexes(&self) -> Result<(), DatabaseError> {
        let ttl = IndexModel::builder()
            .keys(doc! { "expires_at": 1 })
            .options(
                IndexOptions::builder().expire_after(Duration::ZERO).name(TRACE_LEASE_TTL_INDEX.to_string()).build(),
            )
            .build();
        MongoClient::ensure_indexes(&self.client.trace_leases(), vec![ttl]).await
    }

    /// Number of lease documents matching `filter` that were removed.
    async fn remove(&self, filter: Document) -> Result<u64, DatabaseError> {
        record_metrics("delete_one", || async {
            Ok(self.client.trace_leases().delete_one(filter, None).await?.deleted_count)
        })
        .await
    }
}

#[async_trait]
impl LockClient for MongoLockClient {
    async fn acquire_lock_if_available(
        &self,
        key: &str,
        expiry_seconds: u64,
        owner: &str,
    ) -> Result<LockResult, LockError> {
        let ttl = i64::try_from(expiry_seconds).map_err(|_| LockError::InvalidExpiry(expiry_seconds))?;
        let now = Utc::now();

        // The TTL monitor runs about once a minute, so reclaim an expired holder here.
        let expired = doc! { "_id": key, "expires_at": { "$lte": BsonDateTime::from_chrono(now) } };
        let reclaimed = self.remove(expired).await?;
        if reclaimed > 0 {
            debug!(key = %key, "Reclaimed expired lock");
        }

        let lock = LockInfo {
            _id: key.to_string(),
            owner: owner.to_string(),
            acquired_at: now,
            expires_at: now + chrono::Duration::seconds(ttl),
        };

        let inserted =
            record_metrics("insert_one", || async { Ok(self.client.trace_leases().insert_one(&lock, None).await?) })
                .await;
        match inserted {
            Ok(_) => Ok(LockResult::Acquired),
            Err(err) if err.is_duplicate_key() => {
                let holder = self.get_lock_owner(key).await?.unwrap_or_default();
                Ok(LockResult::AlreadyHeld(holder))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<LockResult, LockError> {
        let deleted = self.remove(doc! { "_id": key, "owner": owner }).await?;
        Ok(if deleted > 0 { LockResult::Released } else { LockResult::NotFound })
    }

    async fn get_lock_owner(&self, key: &str) -> Result<Option<String>, LockError> {
        let filter = doc! { "_id": key, "expires_at": { "$gt": BsonDateTime::from_chrono(Utc::now()) } };
        let lock = record_metrics("find_one", || async { Ok(self.client.trace_leases().find_one(filter, None).await?) })
            .await?;
        Ok(lock.map(|lock| lock.owner))
    }
}
