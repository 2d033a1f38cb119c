use crate::client::{ProviderResult, ShareInfoApi};
use crate::config::ProviderConfig;
use crate::host::{ALIAS_DOMAINS, mentions_known_domain, normalize_host};
use crate::mapper::map_result;
use crate::metrics_defs::{
    CHECK_REQUESTS, CHECK_RESULT_EXISTS, PROVIDER_FALLBACK_FAILURE, PROVIDER_FALLBACK_USED,
    PROVIDER_PRIMARY_FAILURE,
};
use crate::shortlink::extract_short_id;
use crate::types::{CheckRequest, CheckResult, ShortLinkId};
use shared::counter;
use std::sync::Arc;
use tracing::Instrument;

struct CheckerInner {
    api: Arc<dyn ShareInfoApi>,
    canonical_host: String,
    aliases: Vec<String>,
    extra_domains: Vec<String>,
    fallback_enabled: bool,
    require_known_domain: bool,
}

/// Runs the whole check pipeline for one request. Cheap to clone, immutable
/// after construction.
#[derive(Clone)]
pub struct Checker {
    inner: Arc<CheckerInner>,
}

impl Checker {
    pub fn new(api: Arc<dyn ShareInfoApi>, config: &ProviderConfig) -> Self {
        let aliases = ALIAS_DOMAINS
            .iter()
            .map(|d| d.to_string())
            .chain(config.alias_domains.iter().cloned())
            .collect();

        Checker {
            inner: Arc::new(CheckerInner {
                api,
                canonical_host: config.canonical_host.clone(),
                aliases,
                extra_domains: config.alias_domains.clone(),
                fallback_enabled: config.fallback_enabled,
                require_known_domain: config.require_known_domain,
            }),
        }
    }

    pub fn canonical_host(&self) -> &str {
        &self.inner.canonical_host
    }

    /// Whether the front door should accept `url` at all.
    pub fn is_supported_link(&self, url: &str) -> bool {
        !self.inner.require_known_domain
            || mentions_known_domain(url, self.inner.extra_domains.as_slice())
    }

    /// Never fails: every problem past parameter validation becomes an
    /// `exists: false` result.
    pub async fn check(&self, request: &CheckRequest) -> CheckResult {
        counter!(CHECK_REQUESTS).increment(1);

        let normalized =
            normalize_host(&request.url, &request.host, self.inner.aliases.as_slice());
        let short_id = match extract_short_id(&normalized) {
            Ok(id) => id,
            Err(e) => {
                tracing::debug!(url = %normalized, "Could not extract short id");
                return CheckResult::failed(e.to_string());
            }
        };

        let span = tracing::info_span!("check", short_id = %short_id, host = %request.host);
        let result = map_result(self.lookup(&short_id, request).instrument(span).await);

        if result.exists() {
            counter!(CHECK_RESULT_EXISTS).increment(1);
        }
        result
    }

    async fn lookup(&self, short_id: &ShortLinkId, request: &CheckRequest) -> ProviderResult {
        let primary_err = match self
            .inner
            .api
            .primary_lookup(short_id, &request.cookie, &request.host)
            .await
        {
            Ok(payload) => return Ok(payload),
            Err(e) => e,
        };

        counter!(PROVIDER_PRIMARY_FAILURE).increment(1);
        if !self.inner.fallback_enabled {
            tracing::warn!(
                error = %primary_err,
                code = ?primary_err.code(),
                "Primary lookup failed"
            );
            return Err(primary_err);
        }

        tracing::warn!(
            error = %primary_err,
            code = ?primary_err.code(),
            "Primary lookup failed, trying fallback"
        );
        counter!(PROVIDER_FALLBACK_USED).increment(1);

        let fallback = self.inner.api.fallback_lookup(short_id).await;
        if let Err(e) = &fallback {
            counter!(PROVIDER_FALLBACK_FAILURE).increment(1);
            tracing::error!(
                primary_error = %primary_err,
                fallback_error = %e,
                "Both provider lookups failed"
            );
        }
        fallback
    }
}
