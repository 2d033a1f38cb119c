pub mod api;
pub mod checker;
pub mod client;
pub mod config;
pub mod host;
pub mod mapper;
pub mod metrics_defs;
pub mod shortlink;
pub mod types;

#[cfg(test)]
mod testutils;

use crate::checker::Checker;
use crate::client::ProviderClient;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum CheckerError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] config::ValidationError),
    #[error("invalid fallback URL: {0}")]
    InvalidFallbackUrl(#[from] url::ParseError),
    #[error("API error: {0}")]
    Api(#[from] api::CheckerApiError),
}

/// Validates `config` and serves the check API until a shutdown signal arrives.
pub async fn run(config: config::Config) -> Result<(), CheckerError> {
    config.validate()?;

    let client = ProviderClient::new(&config.provider)?;
    let checker = Checker::new(Arc::new(client), &config.provider);

    api::serve(&config.listener, checker).await?;
    Ok(())
}
