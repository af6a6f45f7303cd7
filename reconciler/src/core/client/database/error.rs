use mongodb::bson;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Mongo error: {0}")]
    MongoError(#[from] mongodb::error::Error),

    #[error("Failed to serialize document: {0}")]
    FailedToSerializeDocument(String),

    #[error("BSON error: {0}")]
    BsonError(#[from] bson::ser::Error),

    /// Another writer inserted the same key first.
    #[error("Item already exists: {0}")]
    ItemAlreadyExists(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),
}

impl DatabaseError {
    pub fn is_duplicate_key(&self) -> bool {
        match self {
            DatabaseError::ItemAlreadyExists(_) => true,
            DatabaseError::MongoError(err) => super::mongo_client::helpers::is_duplicate_key_error(err),
            _ => false,
        }
    }
}
