use std::future::Future;
use std::time::Instant;

use mongodb::bson::{self, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use opentelemetry::KeyValue;
use serde::Serialize;

use crate::core::client::database::constant::DUPLICATE_KEY_ERROR_CODE;
use crate::core::client::database::error::DatabaseError;
use crate::utils::metrics::RECONCILER_METRICS;

pub trait ToDocument {
    fn to_document(&self) -> Result<Document, DatabaseError>;
}

impl<T: Serialize> ToDocument for T {
    fn to_document(&self) -> Result<Document, DatabaseError> {
        bson::to_document(self).map_err(|e| DatabaseError::FailedToSerializeDocument(e.to_string()))
    }
}

/// Runs a database call and records its latency under `db_operation_name`.
pub async fn record_metrics<T, F, Fut>(operation: &'static str, call: F) -> Result<T, DatabaseError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, DatabaseError>>,
{
    let start = Instant::now();
    let result = call().await;
    RECONCILER_METRICS
        .db_calls_response_time
        .record(start.elapsed().as_secs_f64(), &[KeyValue::new("db_operation_name", operation)]);
    result
}

pub fn is_duplicate_key_error(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_ERROR_CODE,
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_ERROR_CODE,
        _ => false,
    }
}
