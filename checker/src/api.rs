use crate::checker::Checker;
use crate::config::Listener as ListenerConfig;
use crate::metrics_defs::CHECK_REJECTED;
use crate::types::CheckRequest;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::{Method, StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shared::counter;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

#[derive(thiserror::Error, Debug)]
pub enum CheckerApiError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Client-input errors. Upstream and parse failures never end up here; they
/// are part of a 200 check result.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ApiError {
    #[error("Missing 'cookie' parameter")]
    MissingCookie,
    #[error("Missing 'url' parameter")]
    MissingUrl,
    #[error("Invalid share link domain")]
    UnsupportedDomain,
    #[error("Not found")]
    NotFound,
}

impl ApiError {
    fn reason(&self) -> &'static str {
        match self {
            ApiError::MissingCookie => "missing_cookie",
            ApiError::MissingUrl => "missing_url",
            ApiError::UnsupportedDomain => "unsupported_domain",
            ApiError::NotFound => "not_found",
        }
    }
}

#[derive(Serialize)]
struct ApiErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingCookie => StatusCode::UNAUTHORIZED,
            ApiError::MissingUrl | ApiError::UnsupportedDomain => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };

        let body = Json(ApiErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[derive(Clone)]
pub struct AppState {
    checker: Checker,
    started_at: Instant,
}

impl AppState {
    pub fn new(checker: Checker) -> Self {
        AppState {
            checker,
            started_at: Instant::now(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(check_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(cors_layer())
        .with_state(state)
}

pub async fn serve(listener: &ListenerConfig, checker: Checker) -> Result<(), CheckerApiError> {
    let app = router(AppState::new(checker));

    let addr = format!("{}:{}", listener.host, listener.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(listen_addr = %listener.local_addr()?, "Starting share checker");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Share checker stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

/// Every response is readable cross-origin. `OPTIONS` requests are answered
/// by the layer with an empty 200 and never reach a handler.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
}

#[derive(Deserialize, Debug, Default)]
struct CheckParams {
    url: Option<String>,
    cookie: Option<String>,
    host: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn check_handler(
    State(state): State<AppState>,
    Query(params): Query<CheckParams>,
) -> Result<Response, ApiError> {
    let request = match validate(&state.checker, params) {
        Ok(Some(request)) => request,
        Ok(None) => {
            let info = info_document(state.checker.canonical_host());
            return Ok(Json(info).into_response());
        }
        Err(e) => {
            counter!(CHECK_REJECTED, "reason" => e.reason()).increment(1);
            return Err(e);
        }
    };

    let result = state.checker.check(&request).await;
    Ok(Json(result).into_response())
}

/// `Ok(None)` means no check was asked for and the info document is served.
fn validate(checker: &Checker, params: CheckParams) -> Result<Option<CheckRequest>, ApiError> {
    let url = non_empty(params.url);
    let cookie = non_empty(params.cookie);

    let (url, cookie) = match (url, cookie) {
        (None, None) => return Ok(None),
        (Some(_), None) => return Err(ApiError::MissingCookie),
        (None, Some(_)) => return Err(ApiError::MissingUrl),
        (Some(url), Some(cookie)) => (url, cookie),
    };

    if !checker.is_supported_link(&url) {
        return Err(ApiError::UnsupportedDomain);
    }

    let host = non_empty(params.host).unwrap_or_else(|| checker.canonical_host().to_string());
    Ok(Some(CheckRequest::new(url, &cookie, host)))
}

fn info_document(canonical_host: &str) -> serde_json::Value {
    json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Checks whether the files behind a share link still exist",
        "endpoints": {
            "GET /": {
                "description": "Check a share link",
                "parameters": {
                    "url": "Share link to check (required)",
                    "cookie": "Session cookie, with or without the 'ndus=' prefix (required)",
                    "host": format!("Provider API host (optional, default {canonical_host})"),
                },
            },
            "GET /health": {
                "description": "Service health and uptime",
            },
        },
        "example": format!("/?url=https://{canonical_host}/s/1AbCdEf&cookie=YOUR_NDUS_COOKIE"),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: jiff::Timestamp,
    uptime: f64,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK",
        timestamp: jiff::Timestamp::now(),
        uptime: state.started_at.elapsed().as_secs_f64(),
    })
}

async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ProviderClient, ProviderError, ProviderResult, ShareInfoApi};
    use crate::config::{ProviderConfig, Scheme};
    use crate::testutils::{MockProvider, VALID_COOKIE};
    use crate::types::{SharePayload, ShortLinkId};
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::header::{
        ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        ACCESS_CONTROL_REQUEST_METHOD, ORIGIN,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct FixedApi {
        primary: ProviderResult,
        fallback: ProviderResult,
    }

    #[async_trait]
    impl ShareInfoApi for FixedApi {
        async fn primary_lookup(&self, _: &ShortLinkId, _: &str, _: &str) -> ProviderResult {
            self.primary.clone()
        }

        async fn fallback_lookup(&self, _: &ShortLinkId) -> ProviderResult {
            self.fallback.clone()
        }
    }

    fn app_with(primary: ProviderResult, fallback: ProviderResult) -> Router {
        let api = Arc::new(FixedApi { primary, fallback });
        router(AppState::new(Checker::new(api, &ProviderConfig::default())))
    }

    fn default_app() -> Router {
        let payload: SharePayload = serde_json::from_value(json!({
            "errno": 0,
            "list": [{"server_filename": "a.txt", "size": 10, "isdir": 0}]
        }))
        .unwrap();
        app_with(Ok(payload), Err(ProviderError::Status(500)))
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Response) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        (response.status(), response)
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn info_document_without_params() {
        let (status, response) = send(default_app(), Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["name"], "checker");
        assert!(body["endpoints"]["GET /health"].is_object());
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let (status, response) = send(
            default_app(),
            Method::GET,
            "/?url=https://terabox.com/s/1abc",
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Missing 'cookie' parameter"})
        );
    }

    #[tokio::test]
    async fn missing_url_is_bad_request() {
        let (status, response) = send(default_app(), Method::GET, "/?cookie=abc123").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Missing 'url' parameter"})
        );
    }

    #[tokio::test]
    async fn empty_values_count_as_missing() {
        let (status, _) = send(default_app(), Method::GET, "/?url=&cookie=").await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            default_app(),
            Method::GET,
            "/?url=https://terabox.com/s/1abc&cookie=",
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn foreign_domain_is_rejected() {
        let (status, response) = send(
            default_app(),
            Method::GET,
            "/?url=https://example.com/s/1abc&cookie=abc123",
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"error": "Invalid share link domain"})
        );
    }

    #[tokio::test]
    async fn successful_check() {
        let (status, response) = send(
            default_app(),
            Method::GET,
            "/?url=https%3A%2F%2F1024terabox.com%2Fs%2F1abcXYZ&cookie=abc123",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({
                "exists": true,
                "total_files": 1,
                "files": [{"name": "a.txt", "size": 10, "isdir": 0}]
            })
        );
    }

    #[tokio::test]
    async fn upstream_failure_is_still_200() {
        let app = app_with(
            Err(ProviderError::Network("refused".into())),
            Err(ProviderError::Status(503)),
        );
        let (status, response) = send(
            app,
            Method::GET,
            "/?url=https://terabox.com/s/1abc&cookie=abc123",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["exists"], false);
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unparseable_link_is_200() {
        let (status, response) = send(
            default_app(),
            Method::GET,
            "/?url=https://terabox.com/main&cookie=abc123",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"exists": false, "error": "Could not extract short URL from link"})
        );
    }

    #[tokio::test]
    async fn health() {
        let (status, response) = send(default_app(), Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["status"], "OK");
        assert!(body["uptime"].as_f64().unwrap() >= 0.0);
        let timestamp = body["timestamp"].as_str().unwrap();
        assert!(timestamp.parse::<jiff::Timestamp>().is_ok());
    }

    #[tokio::test]
    async fn cors_headers_everywhere() {
        for uri in ["/", "/health", "/?cookie=abc", "/nope"] {
            let (_, response) = send(default_app(), Method::GET, uri).await;
            assert_eq!(
                response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
                "*",
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn options_short_circuits() {
        for uri in ["/", "/health", "/anything"] {
            let (status, response) = send(default_app(), Method::OPTIONS, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert!(response.headers().contains_key(ACCESS_CONTROL_ALLOW_METHODS));

            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            assert!(bytes.is_empty());
        }
    }

    #[tokio::test]
    async fn browser_preflight() {
        let request = axum::http::Request::builder()
            .method(Method::OPTIONS)
            .uri("/?url=x")
            .header(ORIGIN, "https://app.example")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let response = default_app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers();
        assert_eq!(headers.get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(), "*");
        let methods = headers
            .get(ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("GET") && methods.contains("OPTIONS"));
        assert!(
            headers
                .get(ACCESS_CONTROL_ALLOW_HEADERS)
                .unwrap()
                .to_str()
                .unwrap()
                .eq_ignore_ascii_case("content-type")
        );
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let (status, response) = send(default_app(), Method::GET, "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({"error": "Not found"}));
    }

    #[tokio::test]
    async fn custom_host_reaches_provider() {
        let provider = MockProvider::spawn().await;
        let config = ProviderConfig {
            scheme: Scheme::Http,
            fallback_url: provider.fallback_url(),
            ..Default::default()
        };
        let api = Arc::new(ProviderClient::new(&config).unwrap());
        let app = router(AppState::new(Checker::new(api, &config)));

        let cookie = VALID_COOKIE.trim_start_matches("ndus=");
        let uri = format!(
            "/?url=https://terabox.com/s/1abc&cookie={cookie}&host={}",
            provider.host()
        );
        let (status, response) = send(app, Method::GET, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json_body(response).await["total_files"], 2);
    }

    #[tokio::test]
    async fn both_provider_endpoints_failing_is_200() {
        let provider = MockProvider::spawn().await;
        let config = ProviderConfig {
            scheme: Scheme::Http,
            fallback_url: provider.fallback_url(),
            ..Default::default()
        };
        let api = Arc::new(ProviderClient::new(&config).unwrap());
        let app = router(AppState::new(Checker::new(api, &config)));

        let uri = format!(
            "/?url=https://terabox.com/s/1fallbackdown&cookie=wrong&host={}",
            provider.host()
        );
        let (status, response) = send(app, Method::GET, &uri).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json_body(response).await,
            json!({"exists": false, "error": "Provider returned HTTP 503"})
        );
    }
}
