//! Shared utilities for integration testing: a recording transport double
//! and a server harness.

// Not every test binary exercises every helper.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use tokio::net::TcpListener;

use gh_relay::config::RelayConfig;
use gh_relay::http::HttpServer;
use gh_relay::proxy::transport::{OutboundRequest, Transport, TransportError, UpstreamResponse};
use gh_relay::Shutdown;

/// One scripted upstream round trip.
pub struct Hop {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: &'static str,
}

impl Hop {
    pub fn ok(body: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body,
        }
    }

    pub fn redirect(location: &str) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert("location", HeaderValue::from_str(location).unwrap());
        Self {
            status: StatusCode::FOUND,
            headers,
            body: "",
        }
    }
}

/// Transport double that replays scripted hops and records what the
/// pipeline sent upstream.
pub struct MockTransport {
    hops: Mutex<VecDeque<Hop>>,
    calls: AtomicU32,
    targets: Mutex<Vec<String>>,
    headers_seen: Mutex<Vec<HeaderMap>>,
    fail: bool,
}

impl MockTransport {
    pub fn ok(body: &'static str) -> Self {
        Self::with_hops(vec![Hop::ok(body)])
    }

    pub fn with_hops(hops: Vec<Hop>) -> Self {
        Self {
            hops: Mutex::new(hops.into()),
            calls: AtomicU32::new(0),
            targets: Mutex::new(Vec::new()),
            headers_seen: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            hops: Mutex::new(VecDeque::new()),
            calls: AtomicU32::new(0),
            targets: Mutex::new(Vec::new()),
            headers_seen: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn targets(&self) -> Vec<String> {
        self.targets.lock().unwrap().clone()
    }

    pub fn headers_seen(&self) -> Vec<HeaderMap> {
        self.headers_seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: OutboundRequest) -> Result<UpstreamResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.targets.lock().unwrap().push(request.target_url.clone());
        self.headers_seen.lock().unwrap().push(request.headers.clone());

        if self.fail {
            return Err(TransportError::Timeout(Duration::from_millis(10)));
        }

        let hop = self
            .hops
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Hop::ok(""));
        Ok(UpstreamResponse {
            status: hop.status,
            headers: hop.headers,
            body: Body::from(hop.body),
        })
    }
}

/// Spawn a relay server on an ephemeral port, returning its address and
/// the shutdown handle.
pub async fn start_relay(
    config: RelayConfig,
    transport: Arc<MockTransport>,
) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::with_transport(config, transport);
    let receiver = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    (addr, shutdown)
}
