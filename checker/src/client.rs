use crate::config::{ProviderConfig, Scheme};
use crate::metrics_defs::PROVIDER_REQUEST_DURATION;
use crate::types::{SharePayload, ShortLinkId};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, COOKIE, REFERER, USER_AGENT};
use reqwest::{RequestBuilder, Url};
use shared::histogram;
use std::time::Instant;

// The share-info API only answers clients that look like the official mobile app.
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (Linux; Android 13; SM-S918B) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36 dubox;4.7.1;android-android;13";
const ACCEPT_JSON: &str = "application/json, text/plain, */*";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

const SHORT_URL_INFO_PATH: &str = "/api/shorturlinfo";
const FALLBACK_APP_ID: &str = "250528";

pub type ProviderResult = Result<SharePayload, ProviderError>;

/// Why a single provider lookup failed. The display text is what ends up in
/// the `error` field of the check result.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("Network error")]
    Network(String),
    #[error("Provider returned HTTP {0}")]
    Status(u16),
    #[error("{message}")]
    Provider { errno: i64, message: String },
    #[error("Unexpected response from provider")]
    Decode(String),
    #[error("Invalid provider URL: {0}")]
    InvalidUrl(String),
}

impl ProviderError {
    /// The provider's own status code, when the failure came from one.
    pub fn code(&self) -> Option<i64> {
        match self {
            ProviderError::Provider { errno, .. } => Some(*errno),
            _ => None,
        }
    }
}

/// The two share listing endpoints a check can be answered from.
#[async_trait]
pub trait ShareInfoApi: Send + Sync {
    /// Authenticated lookup against `host`, on behalf of the owner of `cookie`.
    async fn primary_lookup(
        &self,
        short_id: &ShortLinkId,
        cookie: &str,
        host: &str,
    ) -> ProviderResult;

    /// Unauthenticated lookup against the fixed fallback endpoint.
    async fn fallback_lookup(&self, short_id: &ShortLinkId) -> ProviderResult;
}

/// HTTP implementation of [`ShareInfoApi`]. Each lookup is exactly one request;
/// timeouts are left to the transport defaults.
#[derive(Clone)]
pub struct ProviderClient {
    client: reqwest::Client,
    scheme: Scheme,
    fallback_url: Url,
}

impl ProviderClient {
    pub fn new(config: &ProviderConfig) -> Result<Self, url::ParseError> {
        Ok(ProviderClient {
            client: reqwest::Client::new(),
            scheme: config.scheme,
            fallback_url: Url::parse(&config.fallback_url)?,
        })
    }

    /// `host` may carry a port but nothing else; anything that would leak
    /// into the path or query is refused.
    fn primary_url(&self, short_id: &ShortLinkId, host: &str) -> Result<Url, ProviderError> {
        let base = format!("{}://localhost{}", self.scheme.as_str(), SHORT_URL_INFO_PATH);
        let mut url = Url::parse(&base).map_err(|e| ProviderError::InvalidUrl(e.to_string()))?;

        let invalid = || ProviderError::InvalidUrl(host.to_string());
        let (name, port) = split_port(host);
        url.set_host(Some(name)).map_err(|_| invalid())?;
        url.set_port(port).map_err(|_| invalid())?;

        url.query_pairs_mut()
            .append_pair("clienttype", "1")
            .append_pair("root", "1")
            .append_pair("shorturl", short_id.as_str());

        Ok(url)
    }

    fn fallback_request_url(&self, short_id: &ShortLinkId) -> Url {
        let mut url = self.fallback_url.clone();
        url.query_pairs_mut()
            .append_pair("app_id", FALLBACK_APP_ID)
            .append_pair("shorturl", short_id.as_str())
            .append_pair("root", "1");
        url
    }
}

fn split_port(host: &str) -> (&str, Option<u16>) {
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name, Some(port)),
            Err(_) => (host, None),
        },
        None => (host, None),
    }
}

#[async_trait]
impl ShareInfoApi for ProviderClient {
    async fn primary_lookup(
        &self,
        short_id: &ShortLinkId,
        cookie: &str,
        host: &str,
    ) -> ProviderResult {
        let url = self.primary_url(short_id, host)?;
        let referer = format!("{}/", url.origin().ascii_serialization());

        let request = self
            .client
            .get(url)
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(ACCEPT, ACCEPT_JSON)
            .header(ACCEPT_LANGUAGE, ACCEPT_LANGUAGE_VALUE)
            .header(REFERER, referer)
            .header(COOKIE, cookie);

        send("primary", request).await
    }

    async fn fallback_lookup(&self, short_id: &ShortLinkId) -> ProviderResult {
        let request = self
            .client
            .get(self.fallback_request_url(short_id))
            .header(USER_AGENT, MOBILE_USER_AGENT)
            .header(ACCEPT, ACCEPT_JSON);

        send("fallback", request).await
    }
}

async fn send(endpoint: &'static str, request: RequestBuilder) -> ProviderResult {
    let start = Instant::now();
    let result = send_inner(request).await;
    histogram!(PROVIDER_REQUEST_DURATION, "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());

    if let Err(e) = &result {
        tracing::debug!(endpoint, error = ?e, "Provider lookup failed");
    }

    result
}

async fn send_inner(request: RequestBuilder) -> ProviderResult {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16()));
    }

    let payload = response
        .json::<SharePayload>()
        .await
        .map_err(|e| ProviderError::Decode(e.to_string()))?;

    match payload.errno {
        Some(errno) if errno != 0 => Err(ProviderError::Provider {
            errno,
            message: payload
                .errmsg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("Provider returned errno {errno}")),
        }),
        _ => Ok(payload),
    }
}
