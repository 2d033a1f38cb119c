//! Process-wide logging and metrics setup shared by the binaries.

use metrics_exporter_statsd::{StatsdBuilder, StatsdError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const DEFAULT_LOG_FILTER: &str = "info";

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("invalid Sentry DSN: {0}")]
    InvalidDsn(#[from] sentry::types::ParseDsnError),
    #[error("could not install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
    #[error("could not build statsd exporter: {0}")]
    Statsd(#[from] StatsdError),
    #[error("a metrics recorder is already installed")]
    RecorderAlreadySet,
}

/// Installs the global tracing subscriber.
///
/// The filter is read from `RUST_LOG` and falls back to `info`. When a Sentry
/// DSN is given, Sentry is initialized and events are forwarded to it through
/// the tracing integration. The returned guard must be held for the lifetime of
/// the process so that pending Sentry events are flushed on exit.
pub fn init_logging(
    sentry_dsn: Option<&str>,
) -> Result<Option<sentry::ClientInitGuard>, TelemetryError> {
    let guard = match sentry_dsn {
        Some(dsn) => {
            let dsn: sentry::types::Dsn = dsn.parse()?;
            Some(sentry::init(sentry::ClientOptions {
                dsn: Some(dsn),
                ..Default::default()
            }))
        }
        None => None,
    };
    let sentry_layer = guard
        .as_ref()
        .map(|_| sentry::integrations::tracing::layer());

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_layer)
        .try_init()?;

    Ok(guard)
}

/// Installs a statsd exporter as the global `metrics` recorder.
pub fn init_metrics(host: &str, port: u16, prefix: &str) -> Result<(), TelemetryError> {
    tracing::debug!(host, port, "Setting up StatsD metrics exporter");

    let recorder = StatsdBuilder::from(host, port).build(Some(prefix))?;
    metrics::set_global_recorder(recorder).map_err(|_| TelemetryError::RecorderAlreadySet)?;

    Ok(())
}
