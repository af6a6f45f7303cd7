use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{FindOneOptions, IndexOptions};
use mongodb::IndexModel;
use tracing::{debug, warn};

use super::r#trait::PendingStateRepository;
use crate::core::client::database::constant::{PENDING_STATE_TTL_INDEX, PENDING_STATE_UNIQUE_INDEX};
use crate::core::client::database::error::DatabaseError;
use crate::core::client::database::mongo_client::helpers::record_metrics;
use crate::core::client::database::mongo_client::MongoClient;
use crate::types::job::JobId;
use crate::types::pending_state::PendingStateRecord;
use crate::types::phase::ReportedPhase;

pub struct MongoPendingStateRepository {
    client: Arc<MongoClient>,
}

impl MongoPendingStateRepository {
    pub fn new(client: Arc<MongoClient>) -> Self {
        Self { client }
    }

    /// Unique key index backing insert-if-absent, plus a TTL index that expires old records.
    pub async fn create_indexes(&self, retention: Duration) -> Result<(), DatabaseError> {
        let unique = IndexModel::builder()
            .keys(doc! { "job_id": 1, "state": 1, "trace_checksum": 1 })
            .options(IndexOptions::builder().unique(true).name(PENDING_STATE_UNIQUE_INDEX.to_string()).build())
            .build();
        let ttl = IndexModel::builder()
            .keys(doc! { "created_at": 1 })
            .options(IndexOptions::builder().expire_after(retention).name(PENDING_STATE_TTL_INDEX.to_string()).build())
            .build();

        MongoClient::ensure_indexes(&self.client.pending_states(), vec![unique, ttl]).await
    }

    async fn find_one(
        &self,
        filter: Document,
        options: Option<FindOneOptions>,
    ) -> Result<Option<PendingStateRecord>, DatabaseError> {
        record_metrics("find_one", || async { Ok(self.client.pending_states().find_one(filter, options).await?) }).await
    }

    fn key_filter(job_id: JobId, state: ReportedPhase, trace_checksum: &str) -> Result<Document, DatabaseError> {
        Ok(doc! {
            "job_id": bson::to_bson(&job_id)?,
            "state": bson::to_bson(&state)?,
            "trace_checksum": trace_checksum,
        })
    }
}

#[async_trait]
impl PendingStateRepository for MongoPendingStateRepository {
    async fn insert_if_absent(&self, record: PendingStateRecord) -> Result<PendingStateRecord, DatabaseError> {
        let filter = Self::key_filter(record.job_id, record.state, &record.trace_checksum)?;

        let collection = self.client.pending_states();
        let inserted = match MongoClient::insert_if_not_exists(&collection, filter.clone(), &record).await {
            Ok(inserted) => inserted,
            // Two concurrent upserts on the unique index: the loser gets E11000.
            Err(err) if err.is_duplicate_key() => {
                return Err(DatabaseError::ItemAlreadyExists(format!(
                    "Pending state already exists: job {} {}",
                    record.job_id, record.state
                )))
            }
            Err(err) => return Err(err),
        };

        if inserted {
            debug!(job_id = record.job_id, state = %record.state, "Pending state created");
            return Ok(record);
        }

        self.find_one(filter, None).await?.ok_or_else(|| {
            warn!(job_id = record.job_id, state = %record.state, "Pending state vanished after upsert");
            DatabaseError::ItemNotFound(format!("Pending state for job {}", record.job_id))
        })
    }

    async fn find(
        &self,
        job_id: JobId,
        state: ReportedPhase,
        trace_checksum: &str,
    ) -> Result<Option<PendingStateRecord>, DatabaseError> {
        let filter = Self::key_filter(job_id, state, trace_checksum)?;
        self.find_one(filter, None).await
    }

    async fn find_latest_for_job(&self, job_id: JobId) -> Result<Option<PendingStateRecord>, DatabaseError> {
        let filter = doc! { "job_id": bson::to_bson(&job_id)? };
        let options = FindOneOptions::builder().sort(doc! { "created_at": -1 }).build();
        self.find_one(filter, Some(options)).await
    }
}
