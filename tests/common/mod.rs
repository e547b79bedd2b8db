//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use notion_cors_proxy::config::ProxyConfig;
use notion_cors_proxy::http::HttpServer;
use notion_cors_proxy::lifecycle::Shutdown;
use tokio::net::TcpListener;

/// A request as received by the mock upstream.
#[derive(Debug, Clone)]
pub struct Captured {
    pub method: Method,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Captured {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("upstream body is not JSON")
    }
}

/// Handle to a running mock upstream.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

#[allow(dead_code)]
impl MockUpstream {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }

    pub fn last(&self) -> Captured {
        self.requests().pop().expect("upstream was not called")
    }
}

/// Start a programmable mock upstream on an ephemeral port. `respond` maps
/// each captured request to `(status, body)`; bodies are served as JSON.
pub async fn start_mock_upstream<F>(respond: F) -> MockUpstream
where
    F: Fn(&Captured) -> (u16, String) + Send + Sync + 'static,
{
    let captured = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let sink = captured.clone();
    let app = Router::new().fallback(
        move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
            let sink = sink.clone();
            let respond = respond.clone();
            async move {
                let request = Captured {
                    method,
                    path_and_query: uri
                        .path_and_query()
                        .map(|pq| pq.as_str().to_string())
                        .unwrap_or_default(),
                    headers,
                    body,
                };
                let (status, body) = respond(&request);
                sink.lock().unwrap().push(request);
                (
                    StatusCode::from_u16(status).unwrap(),
                    [("content-type", "application/json"), ("x-upstream", "mock")],
                    body,
                )
                    .into_response()
            }
        },
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockUpstream { addr, captured }
}

/// Config pointing at `upstream` with everything else defaulted.
#[allow(dead_code)]
pub fn config_for(upstream: &MockUpstream) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.upstream.base_url = upstream.base_url();
    config.upstream.timeout_secs = 5;
    config
}

/// Start the proxy on an ephemeral port.
pub async fn start_proxy(config: ProxyConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}

/// Client that never goes through an environment proxy.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
