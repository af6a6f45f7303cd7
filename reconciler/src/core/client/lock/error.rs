use thiserror::Error;

use crate::core::client::database::DatabaseError;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("Lock store error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Invalid lock expiry: {0} seconds")]
    InvalidExpiry(u64),
}

impl From<mongodb::error::Error> for LockError {
    fn from(err: mongodb::error::Error) -> Self {
        LockError::Database(DatabaseError::MongoError(err))
    }
}
