pub mod constant;
pub mod error;
pub mod mongo_client;
pub mod repository;

pub use error::DatabaseError;
pub use repository::pending_state::{
    InMemoryPendingStateRepository, MongoPendingStateRepository, PendingStateRepository,
};

#[cfg(test)]
pub use repository::pending_state::MockPendingStateRepository;
