//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode, Uri},
    response::Response,
    Router,
};
use progressive_edge::config::ServiceConfig;
use progressive_edge::http::HttpServer;
use progressive_edge::lifecycle::Shutdown;
use progressive_edge::variant::VariantDeriver;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// What the mock origin answers for one path.
pub struct OriginReply {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl OriginReply {
    pub fn ok(content_type: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type),
            body,
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: Some("text/plain"),
            body: body.as_bytes().to_vec(),
        }
    }
}

/// A running mock origin.
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockOrigin {
    /// Base URL the edge resolves identifiers against.
    pub fn base_url(&self) -> String {
        format!("http://{}/images/", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a programmable mock origin on an ephemeral port.
pub async fn start_mock_origin<F>(handler: F) -> MockOrigin
where
    F: Fn(&str) -> OriginReply + Send + Sync + 'static,
{
    let handler = Arc::new(handler);
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    let app = Router::new().fallback(move |uri: Uri| {
        let handler = handler.clone();
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            let reply = handler(uri.path());
            let mut response = Response::new(Body::from(reply.body));
            *response.status_mut() = StatusCode::from_u16(reply.status).unwrap();
            if let Some(content_type) = reply.content_type {
                response
                    .headers_mut()
                    .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            response
        }
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    MockOrigin { addr, hits }
}

/// A running edge server.
pub struct Edge {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<ServiceConfig>,
}

impl Edge {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for Edge {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Config pointing at `origin` with caching and metrics off.
pub fn config_for(origin: &MockOrigin) -> ServiceConfig {
    let mut config = ServiceConfig::default();
    config.origin.base_url = origin.base_url();
    config.origin.connect_timeout_secs = 2;
    config.origin.fetch_timeout_secs = 5;
    config.cache.enabled = false;
    config.observability.metrics_enabled = false;
    config
}

/// Start the edge server on an ephemeral port.
pub async fn start_edge(config: ServiceConfig, deriver: Arc<dyn VariantDeriver>) -> Edge {
    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = HttpServer::with_deriver(config, deriver).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, config_updates, server_shutdown).await;
    });

    Edge {
        addr,
        shutdown,
        updates,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// One part of a parsed multipart body.
#[derive(Debug)]
pub struct Part {
    pub delimiter: String,
    pub content_type: String,
    pub content_length: usize,
    pub payload: Vec<u8>,
}

fn read_line<'a>(body: &'a [u8], pos: &mut usize) -> &'a str {
    let rest = &body[*pos..];
    let end = rest
        .iter()
        .position(|&b| b == b'\n')
        .expect("unterminated header line");
    *pos += end + 1;
    std::str::from_utf8(&rest[..end]).unwrap()
}

/// Split a multipart body using each part's Content-Length.
///
/// Panics if the body has trailing bytes or a part is short.
pub fn parse_parts(body: &[u8]) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut pos = 0;

    while pos < body.len() {
        let delimiter = read_line(body, &mut pos).to_string();
        assert!(delimiter.starts_with("--"), "expected delimiter, got {:?}", delimiter);

        let mut content_type = None;
        let mut content_length = None;
        loop {
            let line = read_line(body, &mut pos);
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(": ").expect("malformed part header");
            match name {
                "Content-Type" => content_type = Some(value.to_string()),
                "Content-Length" => content_length = Some(value.parse::<usize>().unwrap()),
                other => panic!("unexpected part header {other}"),
            }
        }

        let content_length = content_length.expect("part without Content-Length");
        assert!(pos + content_length <= body.len(), "part payload is short");
        let payload = body[pos..pos + content_length].to_vec();
        pos += content_length;

        parts.push(Part {
            delimiter,
            content_type: content_type.expect("part without Content-Type"),
            content_length,
            payload,
        });
    }

    parts
}
