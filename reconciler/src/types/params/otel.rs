use crate::cli::instrumentation::InstrumentationCliArgs;
use crate::ReconcilerError;
use url::Url;

#[derive(Debug, Clone)]
pub struct OTELConfig {
    pub endpoint: Option<Url>,
    pub service_name: String,
}

impl TryFrom<InstrumentationCliArgs> for OTELConfig {
    type Error = ReconcilerError;
    fn try_from(args: InstrumentationCliArgs) -> Result<Self, Self::Error> {
        let service_name = args
            .otel_service_name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ReconcilerError::ConfigError("otel_service_name is required".to_string()))?;
        Ok(Self { endpoint: args.otel_collector_endpoint, service_name })
    }
}
