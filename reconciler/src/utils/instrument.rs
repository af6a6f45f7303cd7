use std::time::Duration;

use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::{runtime, Resource};
use opentelemetry_semantic_conventions::resource::SERVICE_NAME;
use tracing::{info, warn};
use url::Url;

use crate::types::params::OTELConfig;
use crate::{ReconcilerError, ReconcilerResult};

const METRICS_EXPORT_INTERVAL: Duration = Duration::from_secs(5);

/// Metrics export for the reconciler. Without a collector endpoint the global no-op meter stays in place.
pub struct ReconcilerInstrumentation {
    provider: Option<SdkMeterProvider>,
}

impl ReconcilerInstrumentation {
    pub fn new(config: &OTELConfig) -> ReconcilerResult<Self> {
        let Some(endpoint) = config.endpoint.as_ref() else {
            warn!(service = %config.service_name, "No OTEL collector endpoint, trace operation metrics stay local");
            return Ok(Self { provider: None });
        };

        let provider = Self::build_provider(&config.service_name, endpoint)?;
        global::set_meter_provider(provider.clone());
        info!(endpoint = %endpoint, service = %config.service_name, "Exporting metrics over OTLP");
        Ok(Self { provider: Some(provider) })
    }

    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }

    fn build_provider(service_name: &str, endpoint: &Url) -> ReconcilerResult<SdkMeterProvider> {
        let exporter = opentelemetry_otlp::MetricExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.as_str())
            .build()
            .map_err(|err| ReconcilerError::OtlMetricsError(err.to_string()))?;

        let reader = PeriodicReader::builder(exporter, runtime::Tokio).with_interval(METRICS_EXPORT_INTERVAL).build();
        let resource = Resource::new([KeyValue::new(SERVICE_NAME, service_name.to_owned())]);

        Ok(SdkMeterProvider::builder().with_reader(reader).with_resource(resource).build())
    }

    /// Flush pending measurements and stop the exporter.
    pub fn shutdown(&self) -> ReconcilerResult<()> {
        match &self.provider {
            Some(provider) => provider.shutdown().map_err(|err| ReconcilerError::OtlMetricsError(err.to_string())),
            None => Ok(()),
        }
    }
}
