//! Publisher dialects and the shared article-parse driver.
//!
//! Every dialect is a value implementing the small [`SourceDialect`]
//! capability set: identifier patterns (data-driven, loaded from embedded
//! JSON records), PMID/DOI extraction, and table-node discovery. The
//! canonical parse flow -- entity decoding, identifier resolution, metadata,
//! text and space tagging, grid building, table parsing, NeuroVault
//! harvest -- lives once in [`parse_article`] and threads an article
//! builder through, so dialects hold no per-parse state and instances can
//! be shared across workers.

mod default;
mod frontiers;
mod highwire;
mod oup;
mod plos;
mod pmc;
mod sciencedirect;
mod springer;
mod wiley;

pub use default::DefaultSource;
pub use frontiers::FrontiersSource;
pub use highwire::HighWireSource;
pub use oup::OupSource;
pub use plos::PlosSource;
pub use pmc::PmcSource;
pub use sciencedirect::ScienceDirectSource;
pub use springer::SpringerSource;
pub use wiley::WileySource;

use crate::entities::decode_entities;
use crate::fetch::Fetcher;
use crate::grid::build_grid;
use crate::neurovault::harvest_neurovault_links;
use crate::pubmed::{DoiResolver, MetadataResolver};
use crate::space::guess_space;
use crate::tableparser::parse_table;
use crate::text::extract_text;
use coordex_core::{Article, CoordexError, ParseOptions, Result};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::LazyLock;
use std::time::Duration;

static SEL_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("selector is compile-time constant"));
static SEL_META: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("meta").expect("selector is compile-time constant"));
static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("regex is compile-time constant"));
static RE_DOI_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"d?x?\.?doi\.org/(10\.[^"'\s<>]+)"#).expect("regex is compile-time constant")
});

/// One dialect's configuration record as stored in JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub identifiers: Vec<String>,
    #[serde(default)]
    pub entities: HashMap<String, String>,
    /// Politeness delay between fetches, in seconds.
    #[serde(default)]
    pub delay: Option<f64>,
}

impl SourceConfig {
    /// Parse a JSON config record.
    ///
    /// # Errors
    /// Returns a JSON error for malformed records.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Compile identifier patterns for matching.
    ///
    /// # Errors
    /// Returns an error when an identifier pattern does not compile.
    pub fn compile(self) -> Result<CompiledConfig> {
        let identifiers = self
            .identifiers
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    CoordexError::Parser(anyhow::anyhow!(
                        "bad identifier pattern {p:?} for source {}: {e}",
                        self.name
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let mut entities: Vec<(String, String)> = self.entities.into_iter().collect();
        entities.sort();
        Ok(CompiledConfig {
            name: self.name,
            identifiers,
            entities,
            delay: self.delay.map(Duration::from_secs_f64),
        })
    }
}

/// A dialect configuration with compiled identifier patterns.
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub name: String,
    pub identifiers: Vec<Regex>,
    /// Dialect-specific entity substitutions, applied before the baseline.
    pub entities: Vec<(String, String)>,
    /// Politeness delay the ingest wiring should hand to its fetcher.
    pub delay: Option<Duration>,
}

/// A discovered table node with its dialect-provided metadata, detached
/// from any DOM so fetch-based and inline dialects look alike downstream.
#[derive(Debug, Clone, Default)]
pub struct TableBlock {
    /// Outer HTML of the `<table>` subtree.
    pub table_html: String,
    pub number: Option<String>,
    pub label: Option<String>,
    pub caption: Option<String>,
    pub notes: Option<String>,
}

/// Capability set of a publisher dialect.
pub trait SourceDialect: Send + Sync {
    /// The dialect's configuration record.
    fn config(&self) -> &CompiledConfig;

    /// Dialect name (from the configuration record).
    fn name(&self) -> &str {
        &self.config().name
    }

    /// Extract the article's PMID from the DOM, when the publisher embeds
    /// one.
    fn extract_pmid(&self, doc: &Html) -> Option<String> {
        meta_content(doc, "citation_pmid")
    }

    /// Extract the article's DOI from the DOM.
    fn extract_doi(&self, doc: &Html) -> Option<String> {
        meta_content(doc, "citation_doi")
            .map(|d| d.trim_start_matches("doi:").to_string())
            .or_else(|| {
                RE_DOI_LINK
                    .captures(&doc.root_element().html())
                    .map(|caps| caps[1].trim_end_matches('/').to_string())
            })
    }

    /// Locate the article's table nodes and their metadata. Implementations
    /// that need auxiliary HTML (one fragment per table) go through
    /// `fetcher`; a failed fetch loses only that table and is logged, never
    /// raised.
    fn discover_tables(&self, doc: &Html, fetcher: &dyn Fetcher) -> Vec<TableBlock>;
}

/// Collaborators handed to [`parse_article`].
pub struct ParseContext<'a> {
    pub fetcher: &'a dyn Fetcher,
    pub metadata_resolver: Option<&'a dyn MetadataResolver>,
    pub doi_resolver: Option<&'a dyn DoiResolver>,
    pub options: ParseOptions,
}

/// Parse one article with the given dialect.
///
/// The canonical flow shared by every dialect: decode entities, parse the
/// DOM, resolve the PMID (given > embedded > via DOI), fetch metadata
/// (tolerating a null result), extract text and tag the coordinate space,
/// discover and parse tables, and harvest NeuroVault links.
///
/// # Errors
/// Returns [`CoordexError::MissingIdentifier`] when no PMID can be
/// resolved, and propagates malformed-row errors when
/// [`ParseOptions::ignore_bad_rows`] is off.
pub fn parse_article(
    dialect: &dyn SourceDialect,
    html: &str,
    pmid: Option<&str>,
    ctx: &ParseContext<'_>,
) -> Result<Article> {
    let decoded = decode_entities(html, &dialect.config().entities);
    let doc = Html::parse_document(&decoded);

    let extracted_doi = dialect.extract_doi(&doc);
    let pmid_str = pmid
        .map(str::to_string)
        .or_else(|| dialect.extract_pmid(&doc))
        .or_else(|| {
            let doi = extracted_doi.as_deref()?;
            let resolver = ctx.doi_resolver?;
            resolver.pmid_from_doi(doi)
        })
        .ok_or(CoordexError::MissingIdentifier)?;
    let pmid_num: u32 = pmid_str
        .trim()
        .parse()
        .map_err(|_| CoordexError::MissingIdentifier)?;

    let metadata = ctx
        .metadata_resolver
        .and_then(|resolver| resolver.metadata(pmid_str.trim()));

    let mut article = Article::new(pmid_num);
    article.text = extract_text(&doc);
    article.space = guess_space(&article.text);
    article.doi = metadata
        .as_ref()
        .map(|m| m.doi.clone())
        .filter(|d| !d.is_empty())
        .or(extracted_doi);
    article.metadata = metadata;

    for block in dialect.discover_tables(&doc, ctx.fetcher) {
        let fragment = Html::parse_document(&block.table_html);
        let Some(table_el) = fragment.select(&SEL_TABLE).next() else {
            continue;
        };
        let grid = match build_grid(table_el, &ctx.options)? {
            Some(grid) => grid,
            None => continue,
        };
        if let Some(mut table) = parse_table(&grid, &ctx.options) {
            table.position = article.tables.len() + 1;
            table.number = block.number;
            table.label = block.label;
            table.caption = block.caption;
            table.notes = block.notes;
            article.tables.push(table);
        }
    }

    article.neurovault_links = harvest_neurovault_links(&doc);
    Ok(article)
}

/// Registry of publisher dialects, constructed once per process and safe to
/// share across workers.
pub struct SourceRegistry {
    sources: Vec<Box<dyn SourceDialect>>,
    fallback: DefaultSource,
}

impl SourceRegistry {
    /// Load the built-in dialect set.
    ///
    /// # Errors
    /// Returns an error if an embedded configuration record is malformed.
    pub fn new() -> Result<Self> {
        let compile =
            |json: &str| -> Result<CompiledConfig> { SourceConfig::from_json(json)?.compile() };

        let sources: Vec<Box<dyn SourceDialect>> = vec![
            Box::new(HighWireSource::new(compile(include_str!(
                "config/highwire.json"
            ))?)),
            Box::new(ScienceDirectSource::new(compile(include_str!(
                "config/sciencedirect.json"
            ))?)),
            Box::new(PlosSource::new(compile(include_str!("config/plos.json"))?)),
            Box::new(FrontiersSource::new(compile(include_str!(
                "config/frontiers.json"
            ))?)),
            Box::new(OupSource::new(compile(include_str!("config/oup.json"))?)),
            Box::new(WileySource::new(compile(include_str!(
                "config/wiley.json"
            ))?)),
            Box::new(SpringerSource::new(compile(include_str!(
                "config/springer.json"
            ))?)),
            Box::new(PmcSource::new(compile(include_str!("config/pmc.json"))?)),
        ];
        let fallback = DefaultSource::new(compile(include_str!("config/default.json"))?);
        Ok(Self { sources, fallback })
    }

    /// Identify the source of an article from its raw HTML. The reserved
    /// fallback source is never returned here; callers opt into it through
    /// [`fallback`](Self::fallback).
    #[must_use]
    pub fn identify(&self, html: &str) -> Option<&dyn SourceDialect> {
        for source in &self.sources {
            for pattern in &source.config().identifiers {
                if pattern.is_match(html) {
                    log::debug!("matched article to source {}", source.name());
                    return Some(&**source);
                }
            }
        }
        None
    }

    /// Look up a dialect by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn SourceDialect> {
        self.sources
            .iter()
            .find(|s| s.name() == name)
            .map(|s| &**s)
    }

    /// The heuristic fallback source.
    #[must_use]
    pub fn fallback(&self) -> &dyn SourceDialect {
        &self.fallback
    }

    /// Registered dialect names, in match order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }
}

// ---------------------------------------------------------------------------
// Shared DOM helpers for dialect implementations.
// ---------------------------------------------------------------------------

/// Content of `<meta name="...">` (or `property="..."` as used by
/// OpenGraph).
pub(crate) fn meta_content(doc: &Html, name: &str) -> Option<String> {
    for meta in doc.select(&SEL_META) {
        let el = meta.value();
        let matches = el.attr("name") == Some(name) || el.attr("property") == Some(name);
        if matches {
            if let Some(content) = el.attr("content") {
                let content = content.trim();
                if !content.is_empty() {
                    return Some(content.to_string());
                }
            }
        }
    }
    None
}

/// Whitespace-collapsed text of an element.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first descendant matching any of the comma-separated
/// selectors, tried in order.
pub(crate) fn first_text(scope: ElementRef<'_>, selectors: &str) -> Option<String> {
    for selector in selectors.split(',') {
        let Ok(sel) = Selector::parse(selector.trim()) else {
            continue;
        };
        if let Some(el) = scope.select(&sel).next() {
            let text = element_text(el);
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// First number in a label like "Table 5".
pub(crate) fn number_from(text: &str) -> Option<String> {
    RE_NUMBER.captures(text).map(|caps| caps[1].to_string())
}

/// First `<table>` descendant of a container (or the container itself).
pub(crate) fn table_in<'a>(container: ElementRef<'a>) -> Option<ElementRef<'a>> {
    if container.value().name() == "table" {
        return Some(container);
    }
    container.select(&SEL_TABLE).next()
}
