//! Pre-connection vetting of outbound URLs.
//!
//! Every URL this crate fetches passes through [`UrlGuard::vet`] first: the
//! original page, every redirect target, every stylesheet and `@import`
//! target, and logo images. Each hop is vetted independently; there is no
//! validate-once shortcut, which is what closes the DNS-rebinding window
//! together with address pinning in the client.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use async_trait::async_trait;
use url::Url;

use crate::config::FetchConfig;
use crate::error::FetchError;

/// Resolves a hostname to its candidate addresses.
///
/// Production uses the system resolver. Tests substitute a static map so
/// vetting never touches real DNS.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system, via tokio's blocking pool.
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host.to_string(), port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}

/// Vets URLs before any connection is made.
pub struct UrlGuard {
    resolver: Box<dyn HostResolver>,
    denied_hosts: Vec<String>,
    permit_private_ranges: bool,
}

impl UrlGuard {
    pub fn new(config: &FetchConfig, resolver: Box<dyn HostResolver>) -> Self {
        Self {
            resolver,
            denied_hosts: config.denied_hosts.clone(),
            permit_private_ranges: config.permit_private_ranges,
        }
    }

    /// Vet one URL and return the address the connection must be pinned to.
    ///
    /// Rejects non-HTTP(S) schemes, denylisted hostnames, and any URL whose
    /// every resolved address falls in a blocked range. Individual blocked
    /// addresses are skipped; the first acceptable one wins.
    pub async fn vet(&self, url: &Url) -> Result<IpAddr, FetchError> {
        match url.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FetchError::Security(format!(
                    "scheme '{other}' is not fetchable"
                )))
            }
        }
        let host = match url.host() {
            Some(host) => host,
            None => return Err(FetchError::Security("url has no host".to_string())),
        };

        match host {
            url::Host::Domain(name) => {
                // Trailing dots would otherwise sidestep the name checks.
                let name = name.trim_end_matches('.');
                if self.is_denied_host(name) {
                    return Err(FetchError::Security(format!("host '{name}' is denied")));
                }
                let port = url.port_or_known_default().unwrap_or(80);
                let addrs = self
                    .resolver
                    .resolve(name, port)
                    .await
                    .map_err(|e| FetchError::Security(format!("dns failure for '{name}': {e}")))?;
                if addrs.is_empty() {
                    return Err(FetchError::Security(format!(
                        "'{name}' resolved to no addresses"
                    )));
                }
                addrs
                    .into_iter()
                    .find(|ip| self.is_acceptable(*ip))
                    .ok_or_else(|| {
                        FetchError::Security(format!(
                            "all addresses for '{name}' are in blocked ranges"
                        ))
                    })
            }
            url::Host::Ipv4(ip) => self.vet_literal(IpAddr::V4(ip)),
            url::Host::Ipv6(ip) => self.vet_literal(IpAddr::V6(ip)),
        }
    }

    fn vet_literal(&self, ip: IpAddr) -> Result<IpAddr, FetchError> {
        if self.is_acceptable(ip) {
            Ok(ip)
        } else {
            Err(FetchError::Security(format!(
                "address {ip} is in a blocked range"
            )))
        }
    }

    fn is_acceptable(&self, ip: IpAddr) -> bool {
        self.permit_private_ranges || !is_blocked_ip(ip)
    }

    /// Exact match or subdomain of a denied name.
    fn is_denied_host(&self, name: &str) -> bool {
        self.denied_hosts.iter().any(|denied| {
            let denied = denied.trim_end_matches('.');
            name.eq_ignore_ascii_case(denied)
                || name
                    .to_ascii_lowercase()
                    .ends_with(&format!(".{}", denied.to_ascii_lowercase()))
        })
    }
}

/// True when an address must never be connected to.
pub(crate) fn is_blocked_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_blocked_v4(v4),
        IpAddr::V6(v6) => is_blocked_v6(v6),
    }
}

fn is_blocked_v4(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    ip.is_loopback()                                   // 127.0.0.0/8
        || ip.is_private()                             // 10/8, 172.16/12, 192.168/16
        || ip.is_link_local()                          // 169.254.0.0/16
        || ip.is_multicast()                           // 224.0.0.0/4
        || octets[0] == 0                              // 0.0.0.0/8 "this network"
        || (octets[0] == 100 && (64..128).contains(&octets[1]))  // 100.64.0.0/10 CGNAT
        || (octets[0] == 198 && (18..20).contains(&octets[1]))   // 198.18.0.0/15 benchmark
        || octets[0] >= 240                            // 240.0.0.0/4 reserved + broadcast
}

fn is_blocked_v6(ip: Ipv6Addr) -> bool {
    // IPv4-mapped addresses are judged by their embedded v4 address, so
    // ::ffff:10.0.0.1 is exactly as blocked as 10.0.0.1.
    if let Some(v4) = ip.to_ipv4_mapped() {
        return is_blocked_v4(v4);
    }
    let segments = ip.segments();
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.is_multicast()                            // ff00::/8
        || (segments[0] & 0xfe00) == 0xfc00             // fc00::/7 unique-local
        || (segments[0] & 0xffc0) == 0xfe80             // fe80::/10 link-local
}
