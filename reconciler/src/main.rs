use clap::Parser as _;
use dotenvy::dotenv;
use trace_reconciler::cli::{CheckCmd, Cli, Commands, SetupCmd};
use trace_reconciler::config::SharedStore;
use trace_reconciler::setup::setup;
use trace_reconciler::types::params::{MongoConfig, OTELConfig, ReconcilerParams};
use trace_reconciler::utils::instrument::ReconcilerInstrumentation;
use trace_reconciler::utils::logging::init_logging;
use trace_reconciler::ReconcilerResult;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    let cli = Cli::parse();

    match &cli.command {
        Commands::Setup { setup_command } => {
            info!("Executing setup command with args: {:?}", setup_command);
            match setup_reconciler(setup_command).await {
                Ok(_) => info!("Trace reconciler setup completed successfully"),
                Err(e) => {
                    error!(error = %e, error_chain = ?e, "Failed to setup trace reconciler");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { check_command } => match check_reconciler(check_command).await {
            Ok(_) => info!("Trace reconciler configuration is valid"),
            Err(e) => {
                error!(error = %e, error_chain = ?e, "Trace reconciler check failed");
                std::process::exit(1);
            }
        },
    }
}

async fn setup_reconciler(setup_cmd: &SetupCmd) -> ReconcilerResult<()> {
    let mongo = MongoConfig::try_from(setup_cmd.mongodb_args.clone())?;
    let params = ReconcilerParams::try_from(setup_cmd.reconcile_args.clone())?;
    setup(&mongo, &params).await
}

async fn check_reconciler(check_cmd: &CheckCmd) -> ReconcilerResult<()> {
    let otel = OTELConfig::try_from(check_cmd.instrumentation_args.clone())?;
    let instrumentation = ReconcilerInstrumentation::new(&otel)?;

    let mongo = MongoConfig::try_from(check_cmd.mongodb_args.clone())?;
    let params = ReconcilerParams::try_from(check_cmd.reconcile_args.clone())?;
    info!(
        accept_trace = params.accept_trace,
        accept_trace_projects = ?params.accept_trace_projects,
        trace_overwrite = params.trace_overwrite,
        accept_timeout_secs = params.accept_timeout.as_secs(),
        lease_ttl_secs = params.lease_ttl.as_secs(),
        max_backoff_secs = params.max_backoff_seconds,
        metrics_exported = instrumentation.is_exporting(),
        "Resolved reconciler parameters"
    );

    SharedStore::connect(&mongo).await?.health_check().await?;
    instrumentation.shutdown()
}
