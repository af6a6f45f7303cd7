mod memory;
mod mongo;
mod r#trait;

pub use memory::InMemoryPendingStateRepository;
pub use mongo::MongoPendingStateRepository;
pub use r#trait::PendingStateRepository;

#[cfg(test)]
pub use r#trait::MockPendingStateRepository;
