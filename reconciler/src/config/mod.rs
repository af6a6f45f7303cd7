use std::sync::Arc;

use tracing::{debug, info};

use crate::core::client::database::MongoPendingStateRepository;
use crate::core::client::lifecycle::JobLifecycle;
use crate::core::client::lock::MongoLockClient;
use crate::core::client::storage::TraceStorage;
use crate::core::client::MongoClient;
use crate::reconcile::{ReconcilerClients, TraceReconciler};
use crate::types::params::{MongoConfig, ReconcilerParams};
use crate::utils::metrics::{OtelTraceMetrics, TraceMetrics};
use crate::ReconcilerResult;

/// The shared, externally visible state every reconciler worker needs: the pending-state ledger and
/// the trace lease store, both on MongoDB.
pub struct SharedStore {
    pub client: Arc<MongoClient>,
    pub pending_states: Arc<MongoPendingStateRepository>,
    pub locks: Arc<MongoLockClient>,
}

impl SharedStore {
    pub async fn connect(mongo: &MongoConfig) -> ReconcilerResult<Self> {
        let client = Arc::new(MongoClient::new(&mongo.connection_url, &mongo.database_name).await?);
        debug!(database = %mongo.database_name, "MongoDB client created");

        Ok(Self {
            pending_states: Arc::new(MongoPendingStateRepository::new(client.clone())),
            locks: Arc::new(MongoLockClient::new(client.clone())),
            client,
        })
    }

    pub async fn health_check(&self) -> ReconcilerResult<()> {
        self.client.ping().await?;
        info!(database = %self.client.database_name(), "MongoDB is reachable");
        Ok(())
    }

    /// Build a reconciler on this store, with the embedder's trace storage and job lifecycle.
    pub fn reconciler(
        &self,
        storage: Arc<dyn TraceStorage>,
        lifecycle: Arc<dyn JobLifecycle>,
        params: &ReconcilerParams,
    ) -> TraceReconciler {
        let metrics: Arc<dyn TraceMetrics> = Arc::new(OtelTraceMetrics);
        let clients = ReconcilerClients {
            pending_states: self.pending_states.clone(),
            locks: self.locks.clone(),
            storage,
            lifecycle,
            metrics,
        };
        TraceReconciler::new(clients, params)
    }
}
