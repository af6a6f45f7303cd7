pub mod backoff;
pub mod checksum;
pub mod coordinator;
pub mod lease;
pub mod ledger;
pub mod migration;

pub use coordinator::{ReconcilerClients, TraceReconciler};
