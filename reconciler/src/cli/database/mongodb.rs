use clap::Args;

/// Where the pending-state ledger and trace leases live.
#[derive(Debug, Clone, Args)]
pub struct MongoDBCliArgs {
    /// MongoDB connection string.
    #[arg(env = "TRACE_RECONCILER_MONGODB_CONNECTION_URL", long, default_value = Some("mongodb://localhost:27017"))]
    pub mongodb_connection_url: Option<String>,

    /// Database holding the reconciler collections.
    #[arg(env = "TRACE_RECONCILER_DATABASE_NAME", long, default_value = Some("trace_reconciler"))]
    pub mongodb_database_name: Option<String>,
}
