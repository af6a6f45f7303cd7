pub mod database;
pub mod lifecycle;
pub mod lock;
pub mod storage;

pub use database::mongo_client::MongoClient;
pub use database::PendingStateRepository;
pub use lifecycle::{CommitHooks, JobLifecycle};
pub use lock::LockClient;
pub use storage::TraceStorage;
