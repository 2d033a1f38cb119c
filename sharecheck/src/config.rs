use checker::config::Config as CheckerConfig;
use serde::Deserialize;
use std::fs::File;

const DEFAULT_METRICS_PREFIX: &str = "sharecheck";

#[derive(Deserialize, Debug, PartialEq)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,
}

fn default_metrics_prefix() -> String {
    DEFAULT_METRICS_PREFIX.into()
}

#[derive(Deserialize, Debug, PartialEq)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct Config {
    pub metrics: Option<MetricsConfig>,
    pub logging: Option<LoggingConfig>,
    #[serde(flatten)]
    pub checker: CheckerConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let data = serde_yaml::from_reader(file)?;

        Ok(data)
    }

    /// `PORT` wins over the listener port from the file. Unset or empty leaves it alone.
    pub fn apply_port_override(&mut self, port: Option<String>) -> Result<(), ConfigError> {
        let Some(port) = port.filter(|p| !p.trim().is_empty()) else {
            return Ok(());
        };

        match port.trim().parse::<u16>() {
            Ok(p) if p != 0 => {
                self.checker.listener.port = p;
                Ok(())
            }
            _ => Err(ConfigError::InvalidPort(port)),
        }
    }

    pub fn sentry_dsn(&self) -> Option<&str> {
        self.logging.as_ref()?.sentry_dsn.as_deref()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid PORT value: {0:?}")]
    InvalidPort(String),
}
