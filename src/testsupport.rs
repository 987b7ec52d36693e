//! Shared test fixtures for fetch/collector/pipeline test modules.
//!
//! Keeping tiny but reusable helpers here prevents each test module from
//! rebuilding ad-hoc DNS-stub and fixture-server code. Servers bind to an
//! ephemeral loopback port; tests reach them through IP-literal URLs with
//! `permit_private_ranges` switched on.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::config::FetchConfig;
use crate::fetch::HostResolver;

/// Fetch settings for tests that talk to loopback fixture servers.
pub fn local_fetch_config() -> FetchConfig {
    FetchConfig {
        permit_private_ranges: true,
        ..FetchConfig::default()
    }
}

// ---------------------------------------------------------------------------
// DNS stub
// ---------------------------------------------------------------------------

/// Hostname-to-addresses map standing in for DNS. Unknown hosts fail the
/// way NXDOMAIN would.
#[derive(Default)]
pub struct StaticResolver {
    entries: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// A resolver that knows no hosts at all.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, host: &str, addrs: Vec<IpAddr>) -> Self {
        self.entries.insert(host.to_string(), addrs);
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str, _port: u16) -> std::io::Result<Vec<IpAddr>> {
        match self.entries.get(host) {
            Some(addrs) => Ok(addrs.clone()),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no fixture entry for '{host}'"),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixture HTTP server
// ---------------------------------------------------------------------------

/// A loopback HTTP server answering from a fixed path-to-response map.
///
/// Every request path is recorded so tests can assert how often a resource
/// was fetched. Unknown paths answer 404.
pub struct FixtureServer {
    addr: SocketAddr,
    hits: Arc<Mutex<Vec<String>>>,
}

impl FixtureServer {
    pub async fn start(routes: HashMap<String, Vec<u8>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fixture server");
        let addr = listener.local_addr().expect("fixture server addr");
        let hits: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let routes = Arc::new(routes);

        let hits_for_task = hits.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let routes = routes.clone();
                let hits = hits_for_task.clone();
                tokio::spawn(handle_connection(stream, routes, hits));
            }
        });

        Self { addr, hits }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Request paths seen so far, in arrival order.
    pub fn hits(&self) -> Vec<String> {
        self.hits.lock().expect("fixture hits lock").clone()
    }
}

async fn handle_connection(
    mut stream: tokio::net::TcpStream,
    routes: Arc<HashMap<String, Vec<u8>>>,
    hits: Arc<Mutex<Vec<String>>>,
) {
    let mut buf = vec![0u8; 8192];
    let mut total = 0;
    loop {
        let Ok(n) = stream.read(&mut buf[total..]).await else {
            return;
        };
        if n == 0 {
            break;
        }
        total += n;
        if buf[..total].windows(4).any(|w| w == b"\r\n\r\n") || total == buf.len() {
            break;
        }
    }
    let head = String::from_utf8_lossy(&buf[..total]);
    let path = head
        .split_whitespace()
        .nth(1)
        .unwrap_or("/")
        .to_string();
    hits.lock().expect("fixture hits lock").push(path.clone());
    let response = routes
        .get(&path)
        .cloned()
        .unwrap_or_else(|| http_response(404, "text/plain", b"not found"));
    let _ = stream.write_all(&response).await;
    let _ = stream.shutdown().await;
}

// ---------------------------------------------------------------------------
// Response builders
// ---------------------------------------------------------------------------

/// A complete HTTP/1.1 response with Content-Length and Connection: close.
pub fn http_response(status: u16, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        reason(status),
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// A response without Content-Length; the body ends when the connection
/// closes. Exercises the streaming size cap.
pub fn http_response_unsized(status: u16, content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 {status} {}\r\nContent-Type: {content_type}\r\nConnection: close\r\n\r\n",
        reason(status)
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// A 302 redirect to `location`.
pub fn http_redirect(location: &str) -> Vec<u8> {
    format!(
        "HTTP/1.1 302 Found\r\nLocation: {location}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    )
    .into_bytes()
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        301 => "Moved Permanently",
        302 => "Found",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Status",
    }
}
