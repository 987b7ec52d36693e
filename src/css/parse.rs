//! A small scanning CSS parser.
//!
//! This is not a spec-complete CSS engine. It strips comments, walks blocks
//! by brace matching, records `@import` targets, descends into `@media` and
//! `@supports` wrappers, and flattens everything else into selector plus
//! declaration-list rules. Custom properties are additionally collected into
//! a document-order map where the last binding wins. Malformed or truncated
//! input never errors; whatever parses contributes, the rest is dropped.

use std::collections::HashMap;
use tracing::{debug, warn};

/// At-rule wrappers deeper than this stop being scanned.
const MAX_AT_RULE_DEPTH: u32 = 16;

/// One flattened style rule.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The raw selector text, commas and all.
    pub selector: String,
    pub declarations: Vec<Declaration>,
}

/// A single `property: value` pair with `!important` already stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// Lowercased property name; custom properties keep their `--` prefix.
    pub property: String,
    pub value: String,
}

/// Everything lifted out of one stylesheet body.
#[derive(Debug, Clone, Default)]
pub struct ParsedStylesheet {
    pub rules: Vec<StyleRule>,
    /// `@import` targets in source order, unresolved.
    pub imports: Vec<String>,
    /// Custom-property bindings, last binding wins.
    pub variables: HashMap<String, String>,
}

impl ParsedStylesheet {
    /// Fold another parsed sheet into this one, preserving the
    /// last-binding-wins rule for variables.
    pub fn merge(&mut self, other: ParsedStylesheet) {
        self.rules.extend(other.rules);
        self.imports.extend(other.imports);
        self.variables.extend(other.variables);
    }
}

pub fn parse_stylesheet(css: &str) -> ParsedStylesheet {
    let clean = strip_comments(css);
    let mut sheet = ParsedStylesheet::default();
    scan_block(&clean, 0, &mut sheet);
    sheet
}

// ---------------------------------------------------------------------------
// Block scanning
// ---------------------------------------------------------------------------

enum Boundary {
    /// A `;` ends an at-statement at this byte offset.
    Statement(usize),
    /// A `{` opens a block at this byte offset.
    Block(usize),
    End,
}

fn scan_block(text: &str, depth: u32, out: &mut ParsedStylesheet) {
    let mut rest = text;
    loop {
        rest = rest.trim_start();
        if rest.is_empty() {
            return;
        }
        match next_boundary(rest) {
            Boundary::Statement(end) => {
                let statement = rest[..end].trim();
                // At-rule names are case-insensitive.
                let is_import = statement
                    .get(..7)
                    .is_some_and(|p| p.eq_ignore_ascii_case("@import"));
                if is_import {
                    if let Some(target) = import_target(&statement[7..]) {
                        out.imports.push(target);
                    }
                }
                rest = &rest[end + 1..];
            }
            Boundary::Block(open) => {
                let prelude = rest[..open].trim();
                let Some(close) = matching_brace(rest, open) else {
                    warn!("dropping unterminated css block");
                    return;
                };
                let body = &rest[open + 1..close];
                if let Some(at_name) = prelude.strip_prefix('@') {
                    if scans_into(at_name) {
                        if depth < MAX_AT_RULE_DEPTH {
                            scan_block(body, depth + 1, out);
                        } else {
                            debug!("at-rule nesting exceeds {MAX_AT_RULE_DEPTH}, skipping");
                        }
                    }
                    // @font-face, @keyframes and friends carry no selector
                    // colors and are skipped wholesale.
                } else if !prelude.is_empty() {
                    push_rule(prelude, body, out);
                }
                rest = &rest[close + 1..];
            }
            Boundary::End => {
                if !rest.trim().is_empty() {
                    warn!("dropping trailing css fragment without a block");
                }
                return;
            }
        }
    }
}

/// Wrapping at-rules whose bodies contain ordinary rules.
fn scans_into(at_name: &str) -> bool {
    let name = at_name
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or("");
    matches!(name, "media" | "supports" | "layer")
}

/// Find the first `;` or `{` outside of string literals.
fn next_boundary(text: &str) -> Boundary {
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, ';') => return Boundary::Statement(idx),
            (None, '{') => return Boundary::Block(idx),
            (None, _) => {}
        }
    }
    Boundary::End
}

/// Index of the `}` matching the `{` at `open`, honoring string literals.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (idx, c) in text[open..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '{') => depth += 1,
            (None, '}') => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + idx);
                }
            }
            (None, _) => {}
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

fn push_rule(selector: &str, body: &str, out: &mut ParsedStylesheet) {
    let mut declarations = Vec::new();
    for piece in body.split(';') {
        let piece = piece.trim();
        // Nested rules inside a body are not supported; skip fragments the
        // split mangled.
        if piece.is_empty() || piece.contains('{') || piece.contains('}') {
            continue;
        }
        let Some((property, value)) = piece.split_once(':') else {
            continue;
        };
        let property = property.trim();
        // Standard property names are case-insensitive; custom properties
        // are not and must keep their exact spelling for var() lookups.
        let property = if property.starts_with("--") {
            property.to_string()
        } else {
            property.to_ascii_lowercase()
        };
        let value = strip_important(value.trim()).to_string();
        if property.is_empty() || value.is_empty() {
            continue;
        }
        if property.starts_with("--") {
            out.variables.insert(property.clone(), value.clone());
        }
        declarations.push(Declaration { property, value });
    }
    if !declarations.is_empty() {
        out.rules.push(StyleRule {
            selector: selector.to_string(),
            declarations,
        });
    }
}

fn strip_important(value: &str) -> &str {
    let lower = value.to_ascii_lowercase();
    match lower.rfind("!important") {
        Some(pos) if lower[pos + "!important".len()..].trim().is_empty() => {
            value[..pos].trim_end()
        }
        _ => value,
    }
}

// ---------------------------------------------------------------------------
// @import
// ---------------------------------------------------------------------------

/// Pull the URL out of `@import` arguments: `url(x)`, `url("x")`, or a bare
/// quoted string, with any trailing media list ignored.
fn import_target(args: &str) -> Option<String> {
    let args = args.trim();
    let lower = args.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("url(") {
        let close = rest.find(')')?;
        let inner = args["url(".len().."url(".len() + close].trim();
        return Some(unquote(inner).to_string()).filter(|t| !t.is_empty());
    }
    if args.starts_with('"') || args.starts_with('\'') {
        let quote = args.chars().next()?;
        let end = args[1..].find(quote)? + 1;
        let inner = &args[1..end];
        return Some(inner.to_string()).filter(|t| !t.is_empty());
    }
    None
}

fn unquote(text: &str) -> &str {
    let text = text.trim();
    if text.len() >= 2 {
        let first = text.chars().next();
        let last = text.chars().last();
        if (first == Some('"') && last == Some('"'))
            || (first == Some('\'') && last == Some('\''))
        {
            return &text[1..text.len() - 1];
        }
    }
    text
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut chars = css.char_indices().peekable();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    while let Some((idx, c)) = chars.next() {
        if let Some(q) = quote {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                out.push(c);
            }
            '/' if matches!(chars.peek(), Some((_, '*'))) => {
                chars.next();
                // An unterminated comment swallows the remainder, matching
                // how browsers auto-close at end of input.
                match css[idx + 2..].find("*/") {
                    Some(end) => {
                        // Comments act as whitespace between tokens.
                        out.push(' ');
                        let resume = idx + 2 + end + 2;
                        while matches!(chars.peek(), Some((i, _)) if *i < resume) {
                            chars.next();
                        }
                    }
                    None => break,
                }
            }
            _ => out.push(c),
        }
    }
    out
}
