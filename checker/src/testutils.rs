use axum::extract::Query;
use axum::http::header::COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const VALID_COOKIE: &str = "ndus=valid";

/// In-process stand-in for both provider endpoints.
///
/// Share ids with special meaning:
/// - `empty`: share with no files
/// - `missing`: provider error (errno 2)
/// - `http500`: primary answers with HTTP 500
/// - `garbage`: primary answers 200 with a non-JSON body
/// - `fallbackdown`: fallback answers with HTTP 503
///
/// Any other id lists two files on the primary and one on the fallback.
pub struct MockProvider {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockProvider {
    pub async fn spawn() -> Self {
        let app = Router::new()
            .route("/api/shorturlinfo", get(short_url_info))
            .route("/share/list", get(share_list));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        MockProvider { addr, handle }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn fallback_url(&self) -> String {
        format!("http://{}/share/list", self.addr)
    }
}

impl Drop for MockProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Deserialize)]
struct LookupParams {
    shorturl: String,
}

async fn short_url_info(headers: HeaderMap, Query(params): Query<LookupParams>) -> Response {
    match params.shorturl.as_str() {
        "http500" => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        "garbage" => return "<html>maintenance</html>".into_response(),
        _ => {}
    }

    let cookie = headers.get(COOKIE).and_then(|v| v.to_str().ok());
    if cookie != Some(VALID_COOKIE) {
        return Json(json!({"errno": -6, "errmsg": "need verify"})).into_response();
    }

    let body = match params.shorturl.as_str() {
        "empty" => json!({"errno": 0, "list": []}),
        "missing" => json!({"errno": 2, "errmsg": "share not found"}),
        _ => json!({
            "errno": 0,
            "shareid": 1001,
            "list": [
                {"server_filename": "a.txt", "size": 10, "isdir": 0, "fs_id": 1},
                {"server_filename": "b", "size": 0, "isdir": 1, "fs_id": 2},
            ],
        }),
    };
    Json(body).into_response()
}

async fn share_list(Query(params): Query<LookupParams>) -> Response {
    let body = match params.shorturl.as_str() {
        "fallbackdown" => return StatusCode::SERVICE_UNAVAILABLE.into_response(),
        "missing" => json!({"errno": 2}),
        "empty" => json!({"errno": 0}),
        _ => json!({
            "errno": 0,
            "list": [{"server_filename": "fallback.bin", "size": 2048, "isdir": 0}],
        }),
    };
    Json(body).into_response()
}
