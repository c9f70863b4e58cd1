//! Tracing and metrics bootstrap for the embedding process.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{Config, LogFormat};
use crate::error::{OrchestrationError, Result};

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when both are set. Fails if a
/// subscriber is already installed.
pub fn init_tracing(config: &Config) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|err| OrchestrationError::Config(format!("invalid log filter: {err}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    installed.map_err(|err| OrchestrationError::Telemetry(err.to_string()))
}

/// Installs the Prometheus recorder and returns the handle that renders the
/// scrape output.
pub fn install_metrics_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|err| OrchestrationError::Telemetry(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_invalid_filter_is_a_config_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = Config {
            log_level: "orchestration=loud".to_string(),
            ..Config::default()
        };
        assert!(matches!(init_tracing(&config), Err(OrchestrationError::Config(_))));
    }
}
