use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CANONICAL_HOST: &str = "www.terabox.app";
pub const DEFAULT_FALLBACK_URL: &str = "https://www.terabox.app/share/list";

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Canonical host cannot be empty")]
    EmptyCanonicalHost,

    #[error("Invalid fallback URL {0}: {1}")]
    InvalidFallbackUrl(String, url::ParseError),

    #[error("Empty alias domain")]
    EmptyAliasDomain,
}

/// Network listener configuration
#[derive(Clone, Deserialize, Debug, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Deserialize, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    Http,
    #[default]
    Https,
}

impl Scheme {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// Upstream share-info provider settings.
#[derive(Clone, Deserialize, Debug, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    /// Host every alias domain is rewritten to, and the default API host.
    pub canonical_host: String,
    /// Scheme used to reach the primary API host.
    pub scheme: Scheme,
    /// Unauthenticated share listing endpoint queried when the primary lookup fails.
    pub fallback_url: String,
    pub fallback_enabled: bool,
    /// Reject links that do not mention a known provider domain with a 400.
    pub require_known_domain: bool,
    /// Extra alias domains, on top of the built-in list.
    pub alias_domains: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            canonical_host: DEFAULT_CANONICAL_HOST.into(),
            scheme: Scheme::default(),
            fallback_url: DEFAULT_FALLBACK_URL.into(),
            fallback_enabled: true,
            require_known_domain: true,
            alias_domains: Vec::new(),
        }
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.canonical_host.trim().is_empty() {
            return Err(ValidationError::EmptyCanonicalHost);
        }

        if let Err(e) = Url::parse(&self.fallback_url) {
            return Err(ValidationError::InvalidFallbackUrl(
                self.fallback_url.clone(),
                e,
            ));
        }

        if self.alias_domains.iter().any(|d| d.trim().is_empty()) {
            return Err(ValidationError::EmptyAliasDomain);
        }

        Ok(())
    }
}

#[derive(Clone, Deserialize, Debug, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default)]
    pub provider: ProviderConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.provider.validate()?;
        Ok(())
    }
}
