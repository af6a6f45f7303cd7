use tracing::info;

use crate::config::SharedStore;
use crate::types::params::{MongoConfig, ReconcilerParams};
use crate::ReconcilerResult;

/// Create the indexes the shared store relies on. Safe to run repeatedly.
pub async fn setup(mongo: &MongoConfig, params: &ReconcilerParams) -> ReconcilerResult<()> {
    let store = SharedStore::connect(mongo).await?;
    store.health_check().await?;

    store.pending_states.create_indexes(params.pending_state_retention).await?;
    info!(retention_secs = params.pending_state_retention.as_secs(), "Pending state indexes created");

    store.locks.create_indexes().await?;
    info!("Trace lease indexes created");

    Ok(())
}
