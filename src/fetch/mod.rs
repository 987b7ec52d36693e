//! Guarded outbound HTTP.
//!
//! `guard` decides whether a URL may be fetched at all and which address the
//! connection must target; `client` performs the pinned GET with manual
//! redirect handling, timeouts, and size ceilings.

mod client;
mod guard;

pub use client::{ContentFetcher, FetchedDocument};
pub use guard::{HostResolver, SystemResolver, UrlGuard};
