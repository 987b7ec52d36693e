//! IP-pinned HTTP fetching with manual redirect handling.
//!
//! Automatic redirects are disabled; every hop comes back here so its target
//! can be vetted like a fresh URL. The connection for each hop is pinned to
//! the address the guard returned for that hop, so a DNS answer that changes
//! between vetting and connecting cannot steer the request anywhere else.

use std::net::SocketAddr;

use tracing::debug;
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::fetch::guard::{HostResolver, UrlGuard};

/// A fetched response body plus the URL it finally came from.
#[derive(Debug)]
pub struct FetchedDocument {
    pub final_url: Url,
    pub bytes: Vec<u8>,
}

impl FetchedDocument {
    /// Body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Guarded HTTP GET client.
pub struct ContentFetcher {
    guard: UrlGuard,
    config: FetchConfig,
}

impl ContentFetcher {
    pub fn new(config: FetchConfig, resolver: Box<dyn HostResolver>) -> Self {
        Self {
            guard: UrlGuard::new(&config, resolver),
            config,
        }
    }

    /// GET a URL, following up to the configured number of redirects.
    ///
    /// Each redirect target is re-vetted before it is followed. Bodies
    /// larger than the configured ceiling fail with `SizeLimit`, either up
    /// front from Content-Length or while streaming.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchError> {
        let mut current = url.clone();
        let mut hops = 0u32;
        loop {
            let pinned = self.guard.vet(&current).await?;
            let response = self.request(&current, pinned).await?;
            let status = response.status();

            if status.is_redirection() {
                hops += 1;
                if hops > self.config.max_redirects {
                    return Err(FetchError::RedirectLimit(self.config.max_redirects));
                }
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or_else(|| FetchError::Status(status.as_u16()))?;
                current = current.join(location).map_err(|_| {
                    FetchError::Security(format!(
                        "redirect to unparsable location '{location}'"
                    ))
                })?;
                debug!(target = %current, hop = hops, "following redirect");
                continue;
            }
            if !status.is_success() {
                return Err(FetchError::Status(status.as_u16()));
            }

            let bytes = self.read_capped(response).await?;
            return Ok(FetchedDocument {
                final_url: current,
                bytes,
            });
        }
    }

    /// Issue one GET pinned to the vetted address.
    ///
    /// Pinning is per-host, so each hop gets its own client. The hostname
    /// still travels in the request for virtual hosting and TLS.
    async fn request(
        &self,
        url: &Url,
        pinned: std::net::IpAddr,
    ) -> Result<reqwest::Response, FetchError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(self.config.timeout())
            .user_agent(self.config.user_agent.as_str());
        if let Some(url::Host::Domain(name)) = url.host() {
            let port = url.port_or_known_default().unwrap_or(80);
            builder = builder.resolve(name, SocketAddr::new(pinned, port));
        }
        let client = builder.build()?;
        Ok(client.get(url.clone()).send().await?)
    }

    async fn read_capped(&self, mut response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
        let limit = self.config.max_content_bytes;
        if let Some(declared) = response.content_length() {
            if declared > limit {
                return Err(FetchError::SizeLimit(limit));
            }
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if body.len() as u64 + chunk.len() as u64 > limit {
                return Err(FetchError::SizeLimit(limit));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }
}
