//! Stylesheet discovery and bounded `@import` expansion.
//!
//! Linked stylesheets are fetched level by level: the sheets named by
//! `<link>` tags form level zero, the `@import` targets they reveal form
//! level one, and so on up to the configured depth. A request-scoped
//! visited set keeps cyclic or repeated imports from fetching the same URL
//! twice. Sheets at one level are fetched concurrently; results are folded
//! back in document order so later variable bindings still win.

use std::collections::HashSet;
use std::sync::Arc;

use scraper::{Html, Selector};
use tokio::task::JoinSet;
use tracing::{debug, warn};
use url::Url;

use crate::config::CollectorConfig;
use crate::css::cache::StylesheetCache;
use crate::css::parse::{parse_stylesheet, ParsedStylesheet};
use crate::fetch::ContentFetcher;

pub struct StylesheetCollector {
    fetcher: Arc<ContentFetcher>,
    cache: StylesheetCache,
    max_import_depth: u32,
}

impl StylesheetCollector {
    pub fn new(
        fetcher: Arc<ContentFetcher>,
        cache: StylesheetCache,
        config: &CollectorConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            max_import_depth: config.max_import_depth,
        }
    }

    /// Gather every reachable style rule for a fetched page.
    ///
    /// Linked sheets and their imports come first, inline `<style>` blocks
    /// last, so inline bindings override linked ones. A stylesheet that
    /// fails to fetch contributes nothing; it never aborts the collection.
    pub async fn collect(&self, html: &str, base: &Url) -> ParsedStylesheet {
        let (links, inline_blocks) = discover(html, base);

        let mut visited: HashSet<String> = HashSet::new();
        let mut level: Vec<Url> = Vec::new();
        for link in links {
            if visited.insert(link.to_string()) {
                level.push(link);
            }
        }

        let mut aggregate = ParsedStylesheet::default();
        let mut depth = 0u32;
        while !level.is_empty() && depth <= self.max_import_depth {
            let mut join = JoinSet::new();
            for (idx, sheet_url) in level.drain(..).enumerate() {
                let fetcher = self.fetcher.clone();
                let cache = self.cache.clone();
                join.spawn(async move {
                    let fetched = fetch_sheet(fetcher, cache, &sheet_url).await;
                    (idx, fetched)
                });
            }

            let mut results = Vec::new();
            while let Some(joined) = join.join_next().await {
                match joined {
                    Ok(result) => results.push(result),
                    Err(e) => warn!(error = %e, "stylesheet task failed to join"),
                }
            }
            // Completion order is arbitrary; document order decides merges.
            results.sort_by_key(|(idx, _)| *idx);

            let mut next_level = Vec::new();
            for (_, fetched) in results {
                let Some((parsed, sheet_base)) = fetched else { continue };
                for target in &parsed.imports {
                    match sheet_base.join(target) {
                        Ok(import_url) => {
                            if depth + 1 > self.max_import_depth {
                                debug!(
                                    target = %import_url,
                                    "dropping import beyond depth {}",
                                    self.max_import_depth
                                );
                            } else if visited.insert(import_url.to_string()) {
                                next_level.push(import_url);
                            }
                        }
                        Err(e) => {
                            debug!(target = %target, error = %e, "unresolvable @import target")
                        }
                    }
                }
                aggregate.merge(parsed);
            }
            level = next_level;
            depth += 1;
        }

        for block in inline_blocks {
            // Inline blocks do not recurse; any @import they carry is
            // recorded but never followed.
            aggregate.merge(parse_stylesheet(&block));
        }
        aggregate
    }
}

/// Pull `<link rel=stylesheet>` targets and inline `<style>` bodies out of
/// the markup. Synchronous on purpose: the parsed DOM is not `Send` and must
/// not live across an await.
fn discover(html: &str, base: &Url) -> (Vec<Url>, Vec<String>) {
    let document = Html::parse_document(html);
    let link_selector = Selector::parse("link[href]").unwrap();
    let style_selector = Selector::parse("style").unwrap();

    let mut links = Vec::new();
    for element in document.select(&link_selector) {
        let is_stylesheet = element.value().attr("rel").is_some_and(|rel| {
            rel.split_whitespace()
                .any(|token| token.eq_ignore_ascii_case("stylesheet"))
        });
        if !is_stylesheet {
            continue;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match base.join(href.trim()) {
            Ok(resolved) => links.push(resolved),
            Err(e) => debug!(href = %href, error = %e, "unresolvable stylesheet link"),
        }
    }

    let inline_blocks = document
        .select(&style_selector)
        .map(|element| element.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .collect();

    (links, inline_blocks)
}

/// Fetch one stylesheet through the cache and parse it, returning the base
/// URL its relative imports resolve against. A fetch that was redirected
/// resolves imports against where the sheet actually came from, not where
/// it was requested.
async fn fetch_sheet(
    fetcher: Arc<ContentFetcher>,
    cache: StylesheetCache,
    url: &Url,
) -> Option<(ParsedStylesheet, Url)> {
    let key = url.to_string();
    if let Some((body, base)) = cache.get(&key).await {
        return Some((parse_stylesheet(&body), base));
    }
    match fetcher.fetch(url).await {
        Ok(doc) => {
            let base = doc.final_url.clone();
            let body: Arc<str> = Arc::from(doc.text());
            cache.insert(key, base.clone(), body.clone()).await;
            Some((parse_stylesheet(&body), base))
        }
        Err(e) => {
            warn!(url = %url, error = %e, "stylesheet fetch failed");
            None
        }
    }
}
