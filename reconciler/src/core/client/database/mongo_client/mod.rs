pub mod helpers;

use mongodb::bson::{doc, Document};
use mongodb::options::{ClientOptions, UpdateOptions};
use mongodb::{Client, Collection, Database, IndexModel};
use serde::Serialize;

use self::helpers::{record_metrics, ToDocument};
use crate::core::client::database::constant::{APP_NAME, PENDING_STATES_COLLECTION, TRACE_LEASES_COLLECTION};
use crate::core::client::database::error::DatabaseError;
use crate::core::client::lock::LockInfo;
use crate::types::pending_state::PendingStateRecord;

/// Connection to the reconciler database, handing out typed handles on the collections it owns.
pub struct MongoClient {
    database: Database,
}

impl MongoClient {
    pub async fn new(connection_uri: &str, database_name: &str) -> Result<Self, DatabaseError> {
        let mut options = ClientOptions::parse(connection_uri).await?;
        options.app_name = Some(APP_NAME.to_string());
        let client = Client::with_options(options)?;
        Ok(Self { database: client.database(database_name) })
    }

    pub fn pending_states(&self) -> Collection<PendingStateRecord> {
        self.database.collection(PENDING_STATES_COLLECTION)
    }

    pub fn trace_leases(&self) -> Collection<LockInfo> {
        self.database.collection(TRACE_LEASES_COLLECTION)
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    /// Insert `document` only if nothing matches `filter`, via a `$setOnInsert` upsert.
    /// Returns true when this call created the document.
    pub async fn insert_if_not_exists<T>(
        collection: &Collection<T>,
        filter: Document,
        document: &T,
    ) -> Result<bool, DatabaseError>
    where
        T: Serialize + Send + Sync,
    {
        record_metrics("insert_if_not_exists", || async {
            let update = doc! { "$setOnInsert": document.to_document()? };
            let options = UpdateOptions::builder().upsert(true).build();
            let result = collection.update_one(filter, update, options).await?;
            Ok(result.upserted_id.is_some())
        })
        .await
    }

    pub async fn ensure_indexes<T>(collection: &Collection<T>, indexes: Vec<IndexModel>) -> Result<(), DatabaseError>
    where
        T: Send + Sync,
    {
        record_metrics("create_indexes", || async {
            collection.create_indexes(indexes, None).await?;
            Ok(())
        })
        .await
    }

    pub async fn ping(&self) -> Result<(), DatabaseError> {
        record_metrics("ping", || async {
            self.database.run_command(doc! { "ping": 1 }, None).await?;
            Ok(())
        })
        .await
    }
}
