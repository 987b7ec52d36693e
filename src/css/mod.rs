//! Stylesheet handling: discovery, caching, parsing, and color literals.

mod cache;
mod collector;
pub mod color;
mod parse;

pub use cache::StylesheetCache;
pub use collector::StylesheetCollector;
pub use color::{normalize_color, ColorLiteral};
pub use parse::{parse_stylesheet, Declaration, ParsedStylesheet, StyleRule};
