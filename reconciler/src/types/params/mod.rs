pub mod database;
pub mod otel;
pub mod reconcile;

pub use database::MongoConfig;
pub use otel::OTELConfig;
pub use reconcile::{CoordinatorConfig, ReconcilerParams};
