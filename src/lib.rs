//! Sitetint — brand color theme extraction from websites.
//!
//! Point the extractor at a URL and it fetches the page, aggregates every
//! reachable stylesheet, ranks the colors it finds, clusters them into an
//! accessible palette, and builds matching light and dark themes. Extraction
//! always settles on a usable result: when a site yields no signal the
//! orchestrator degrades through a logo-based hybrid state down to a
//! built-in default palette.
//!
//! # Quick start
//!
//! ```no_run
//! use sitetint::config::ExtractionConfig;
//! use sitetint::orchestrator::ThemeOrchestrator;
//!
//! # async fn example() {
//! let orchestrator = ThemeOrchestrator::new(ExtractionConfig::default());
//! let result = orchestrator
//!     .extract("https://example.com", None)
//!     .await
//!     .unwrap();
//! println!("primary: {}", result.themes.light.colors.primary);
//! # }
//! ```

pub mod cluster;
pub mod config;
pub mod css;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod logo;
pub mod orchestrator;
#[cfg(test)]
pub mod testsupport;
pub mod theme;
