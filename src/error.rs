//! Unified error types for the extraction pipeline.

use std::fmt;

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Errors arising from vetting or fetching a single remote resource.
///
/// Every variant is terminal for that one fetch. Callers in the collection
/// layer catch these per-URL and move on; none of them ever reach the
/// public extraction API.
#[derive(Debug)]
pub enum FetchError {
    /// Disallowed scheme/hostname, or every resolved address sits in a
    /// blocked IP range. Never retried.
    Security(String),
    /// Transport-level failure (timeout, connect, protocol) from reqwest.
    Http(reqwest::Error),
    /// The server answered with a non-2xx/3xx status.
    Status(u16),
    /// The response body exceeded the configured byte ceiling.
    SizeLimit(u64),
    /// The redirect chain exceeded the configured hop maximum.
    RedirectLimit(u32),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Security(msg) => write!(f, "blocked: {msg}"),
            Self::Http(e) => write!(f, "http: {e}"),
            Self::Status(code) => write!(f, "unexpected status {code}"),
            Self::SizeLimit(limit) => write!(f, "response larger than {limit} bytes"),
            Self::RedirectLimit(max) => write!(f, "more than {max} redirects"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

// ---------------------------------------------------------------------------
// ExtractError
// ---------------------------------------------------------------------------

/// Errors surfaced to external callers of the theme extraction API.
///
/// The orchestrator degrades every internal failure to a fallback theme, so
/// the only way extraction itself can fail is an input URL that cannot be
/// parsed at all.
#[derive(Debug)]
pub enum ExtractError {
    /// The supplied website URL is not parseable.
    InvalidUrl(url::ParseError),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(e) => write!(f, "invalid url: {e}"),
        }
    }
}

impl std::error::Error for ExtractError {}

impl From<url::ParseError> for ExtractError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

/// Errors when loading or parsing configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Toml(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Toml(e) => write!(f, "toml: {e}"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml(e)
    }
}
