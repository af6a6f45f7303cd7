use clap::{Parser, Subcommand};

pub mod database;
pub mod instrumentation;
pub mod reconcile;

#[derive(Parser, Debug)]
#[command(
    name = "trace-reconciler",
    about = "Trace Reconciler - applies runner build-state updates once their trace is safe to finalize",
    after_help = "Examples:\n  \
    trace-reconciler setup --mongodb-connection-url mongodb://localhost:27017\n  \
    trace-reconciler check --accept-trace --accept-trace-project 42"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the MongoDB indexes the pending-state ledger and the trace lease rely on
    Setup {
        #[command(flatten)]
        setup_command: Box<SetupCmd>,
    },
    /// Validate configuration and check connectivity to MongoDB
    Check {
        #[command(flatten)]
        check_command: Box<CheckCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
pub struct SetupCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub reconcile_args: reconcile::ReconcileCliArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten)]
    pub reconcile_args: reconcile::ReconcileCliArgs,

    #[clap(flatten)]
    pub instrumentation_args: instrumentation::InstrumentationCliArgs,
}
