pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod reconcile;
pub mod setup;
pub mod types;
pub mod utils;

#[cfg(test)]
pub mod tests;

// Re-export commonly used item
pub use error::{ReconcilerError, ReconcilerResult};
pub use reconcile::{ReconcilerClients, TraceReconciler};
