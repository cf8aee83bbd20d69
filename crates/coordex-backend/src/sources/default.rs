//! Heuristic fallback dialect for publishers without a dedicated adapter.
//!
//! Four discovery strategies run in order; the first that yields usable
//! containers wins:
//!
//! 1. A curated sweep of publisher-agnostic container selectors.
//! 2. Semantic markup: captioned tables, `role="table"`, or tables
//!    directly preceded by a "Table N" heading.
//! 3. Content: tables whose text carries coordinate triples, or whose
//!    headers combine neuroimaging vocabulary with statistical patterns.
//! 4. Every table, minus navigation/layout tables.
//!
//! When nothing is found inline, anchor text and URL shapes are scanned for
//! linked full-size tables, resolved against the page's canonical URL and
//! fetched. JavaScript-gated tables are only detected and logged; nothing
//! here evaluates scripts.

use super::{
    element_text, first_text, meta_content, number_from, table_in, CompiledConfig, SourceDialect,
    TableBlock,
};
use crate::fetch::Fetcher;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

const CONTAINER_SELECTORS: &[&str] = &[
    "div.tables",
    "div[class*=\"table-wrap\"]",
    "div[class*=\"tableContainer\"]",
    "div[class*=\"article-table\"]",
    "figure[id*=\"table\"]",
    "div.table-full-width-wrap",
    "dl.table",
    "table-wrap",
];

static SEL_ALL_TABLES: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("selector is compile-time constant"));
static SEL_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("selector is compile-time constant"));
static SEL_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("selector is compile-time constant"));
static SEL_HEADER_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th").expect("selector is compile-time constant"));
static SEL_CAPTION: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("caption").expect("selector is compile-time constant"));
static SEL_JS_GATED: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[data-table-url], [class*=\"table-expand-inline\"]")
        .expect("selector is compile-time constant")
});

static RE_HEADING_TABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^table\s*\d+").expect("regex is compile-time constant"));
static RE_TRIPLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\d{1,3}\s*[,;\t ]\s*-?\d{1,3}\s*[,;\t ]\s*-?\d{1,3}")
        .expect("regex is compile-time constant")
});
static RE_VOCAB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)region|anatom|cluster|voxel|coordinate|talairach|mni|brodmann|hemisphere")
        .expect("regex is compile-time constant")
});
static RE_STAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)p\s*[<=]|[tzf]\s*=|p[\s-]?value|[zt][\s-]?score")
        .expect("regex is compile-time constant")
});
static RE_NAV_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(nav|menu|footer|sidebar|breadcrumb|masthead)")
        .expect("regex is compile-time constant")
});
static RE_NAV_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)log\s?in|sign\s?in|subscribe|privacy policy|contact us|site map")
        .expect("regex is compile-time constant")
});
static RE_EXCLUDED_CONTEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)related[\s_-]articles|advertisement|recommended|cited[\s_-]by|also[\s_-]read")
        .expect("regex is compile-time constant")
});
static RE_LINK_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)full[\s-]?size table|view table|expand table|table\s+\d+")
        .expect("regex is compile-time constant")
});
static RE_LINK_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)/T\d+\.expansion\.html|/tables/\d+|\?table=\d+|#table\d+|/table\d+\.html")
        .expect("regex is compile-time constant")
});

pub struct DefaultSource {
    config: CompiledConfig,
}

impl DefaultSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }

    /// Strategy 1: selector sweep, keeping containers that actually hold a
    /// table.
    fn sweep_containers<'a>(doc: &'a Html) -> Vec<ElementRef<'a>> {
        let mut containers = Vec::new();
        for selector in CONTAINER_SELECTORS {
            let Ok(sel) = Selector::parse(selector) else {
                continue;
            };
            for container in doc.select(&sel) {
                if table_in(container).is_some() {
                    containers.push(container);
                }
            }
        }
        containers
    }

    /// Strategy 2: semantically marked-up tables.
    fn semantic_tables<'a>(doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&SEL_ALL_TABLES)
            .filter(|table| {
                table.select(&SEL_CAPTION).next().is_some()
                    || table.value().attr("role") == Some("table")
                    || preceding_heading(*table)
                        .is_some_and(|h| RE_HEADING_TABLE.is_match(&h))
            })
            .collect()
    }

    /// Strategy 3: tables whose content looks like coordinates.
    fn content_tables<'a>(doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&SEL_ALL_TABLES)
            .filter(|table| {
                let text = element_text(*table);
                if RE_TRIPLE.is_match(&text) {
                    return true;
                }
                let headers: String = table
                    .select(&SEL_HEADER_CELLS)
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join(" ");
                RE_VOCAB.is_match(&headers) && RE_STAT.is_match(&text)
            })
            .collect()
    }

    /// Strategy 4: everything that is not navigation or page layout.
    fn remaining_tables<'a>(doc: &'a Html) -> Vec<ElementRef<'a>> {
        doc.select(&SEL_ALL_TABLES)
            .filter(|table| !is_navigation_table(*table))
            .collect()
    }

    fn blocks_from(&self, containers: Vec<ElementRef<'_>>) -> Vec<TableBlock> {
        let mut seen = HashSet::new();
        let mut blocks = Vec::new();
        for container in containers {
            let Some(table) = table_in(container) else {
                continue;
            };
            if !seen.insert(table.id()) {
                continue;
            }
            if let Some(block) = block_from_container(container) {
                blocks.push(block);
            }
        }
        blocks
    }

    /// Linked-table recovery: follow anchors that look like full-size
    /// table links, resolving relative URLs against the page's canonical
    /// URL.
    fn linked_tables(&self, doc: &Html, fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let base = meta_content(doc, "citation_public_url")
            .or_else(|| meta_content(doc, "citation_fulltext_html_url"))
            .or_else(|| meta_content(doc, "og:url"));

        let mut urls: Vec<String> = Vec::new();
        let mut fragment_ids: Vec<String> = Vec::new();
        for anchor in doc.select(&SEL_ANCHOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let text = element_text(anchor);
            if !RE_LINK_TEXT.is_match(&text) && !RE_LINK_URL.is_match(href) {
                continue;
            }
            if let Some(id) = href.strip_prefix('#') {
                if !fragment_ids.iter().any(|f| f == id) {
                    fragment_ids.push(id.to_string());
                }
            } else if let Some(url) = resolve_url(base.as_deref(), href) {
                if !urls.contains(&url) {
                    urls.push(url);
                }
            }
        }

        let mut blocks = Vec::new();
        for url in urls {
            let body = match fetcher.fetch(&url) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("linked table fetch failed: {e}");
                    continue;
                }
            };
            let fragment = Html::parse_document(&body);
            let linked: Vec<ElementRef<'_>> = fragment.select(&SEL_ALL_TABLES).collect();
            blocks.extend(self.blocks_from(linked));
        }
        for id in fragment_ids {
            let Ok(sel) = Selector::parse(&format!("#{id}")) else {
                continue;
            };
            if let Some(container) = doc.select(&sel).next() {
                blocks.extend(self.blocks_from(vec![container]));
            }
        }
        blocks
    }
}

impl SourceDialect for DefaultSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let gated = doc.select(&SEL_JS_GATED).count();
        if gated > 0 {
            log::info!("detected {gated} javascript-gated table element(s); not evaluated");
        }

        let strategies: [(&str, Vec<ElementRef<'_>>); 4] = [
            ("selector sweep", Self::sweep_containers(doc)),
            ("semantic markup", Self::semantic_tables(doc)),
            ("content heuristics", Self::content_tables(doc)),
            ("all tables minus navigation", Self::remaining_tables(doc)),
        ];
        for (name, containers) in strategies {
            if containers.is_empty() {
                continue;
            }
            let blocks = self.blocks_from(containers);
            if !blocks.is_empty() {
                log::debug!("default source strategy {name:?} found {} table(s)", blocks.len());
                return blocks;
            }
        }

        let linked = self.linked_tables(doc, fetcher);
        if !linked.is_empty() {
            log::debug!("linked-table recovery found {} table(s)", linked.len());
        }
        linked
    }
}

/// Build a table block from a container, trying the four metadata styles
/// in order: XML (`label`/`title`/`table-wrap-foot`), HTML container
/// classes, table-level (`caption`/`tfoot`), and finally the preceding
/// heading.
fn block_from_container(container: ElementRef<'_>) -> Option<TableBlock> {
    let table = table_in(container)?;
    if is_excluded_context(container) {
        log::debug!("dropping table in excluded context");
        return None;
    }

    let mut label = first_text(container, "label")
        .or_else(|| first_text(container, ".label, .table-label"));
    let caption = first_text(container, "title")
        .or_else(|| first_text(container, ".caption, .captions, p.caption"))
        .or_else(|| first_text(table, "caption"));
    let notes = first_text(container, "table-wrap-foot")
        .or_else(|| first_text(container, ".fn, .footnote, .note, .tblFootnote, .tw-foot"))
        .or_else(|| first_text(table, "tfoot"));
    if label.is_none() {
        label = preceding_heading(container).filter(|h| RE_HEADING_TABLE.is_match(h));
    }

    let number = label
        .as_deref()
        .and_then(number_from)
        .or_else(|| caption.as_deref().filter(|c| RE_HEADING_TABLE.is_match(c)).and_then(number_from));

    Some(TableBlock {
        table_html: table.html(),
        number,
        label,
        caption,
        notes,
    })
}

/// Text of the nearest preceding sibling element, for "Table N" headings
/// rendered outside any container.
fn preceding_heading(el: ElementRef<'_>) -> Option<String> {
    for sibling in el.prev_siblings() {
        if let Some(text) = sibling.value().as_text() {
            if text.trim().is_empty() {
                continue;
            }
            return Some(text.trim().to_string());
        }
        if let Some(element) = ElementRef::wrap(sibling) {
            let text = element_text(element);
            if text.is_empty() {
                continue;
            }
            return Some(text);
        }
    }
    None
}

/// Navigation/layout detection: CSS-class indicators on the table or its
/// ancestors, a high link-to-cell ratio, or navigation keyword content.
fn is_navigation_table(table: ElementRef<'_>) -> bool {
    let class_hit = std::iter::once(table)
        .chain(table.ancestors().filter_map(ElementRef::wrap))
        .any(|el| {
            el.value()
                .attr("class")
                .is_some_and(|c| RE_NAV_CLASS.is_match(c))
        });
    if class_hit {
        return true;
    }

    let cells = table.select(&SEL_CELLS).count();
    let links = table.select(&SEL_ANCHOR).count();
    if cells > 0 && links * 2 > cells {
        return true;
    }

    RE_NAV_TEXT.is_match(&element_text(table))
}

/// Containers living inside related-articles panels, ads and the like.
fn is_excluded_context(container: ElementRef<'_>) -> bool {
    container
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(4)
        .any(|el| {
            let class = el.value().attr("class").unwrap_or("");
            let id = el.value().attr("id").unwrap_or("");
            RE_EXCLUDED_CONTEXT.is_match(class) || RE_EXCLUDED_CONTEXT.is_match(id)
        })
}

/// Resolve a possibly relative link against a base URL.
fn resolve_url(base: Option<&str>, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    let base = base?;
    let (scheme, rest) = base.split_once("://")?;
    if let Some(tail) = href.strip_prefix("//") {
        return Some(format!("{scheme}://{tail}"));
    }
    if href.starts_with('/') {
        let host = rest.split('/').next()?;
        return Some(format!("{scheme}://{host}{href}"));
    }
    Some(format!("{}/{}", base.trim_end_matches('/'), href))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url() {
        let base = Some("https://journals.test/content/11/12/1136");
        assert_eq!(
            resolve_url(base, "/content/11/12/1136/T1.expansion.html").as_deref(),
            Some("https://journals.test/content/11/12/1136/T1.expansion.html")
        );
        assert_eq!(
            resolve_url(base, "T1.expansion.html").as_deref(),
            Some("https://journals.test/content/11/12/1136/T1.expansion.html")
        );
        assert_eq!(
            resolve_url(base, "https://other.test/t.html").as_deref(),
            Some("https://other.test/t.html")
        );
        assert_eq!(resolve_url(None, "relative.html"), None);
    }

    #[test]
    fn test_navigation_table_by_class() {
        let doc = Html::parse_document(
            "<div class=\"site-nav\"><table><tr><td><a href=\"/\">Home</a></td></tr></table></div>",
        );
        let table = doc.select(&SEL_ALL_TABLES).next().expect("table");
        assert!(is_navigation_table(table));
    }

    #[test]
    fn test_navigation_table_by_link_ratio() {
        let doc = Html::parse_document(
            "<table><tr>\
             <td><a href=\"/a\">A</a></td><td><a href=\"/b\">B</a></td>\
             <td><a href=\"/c\">C</a></td></tr></table>",
        );
        let table = doc.select(&SEL_ALL_TABLES).next().expect("table");
        assert!(is_navigation_table(table));
    }

    #[test]
    fn test_data_table_not_navigation() {
        let doc = Html::parse_document(
            "<table><tr><th>region</th><th>x</th></tr>\
             <tr><td>insula</td><td>-30</td></tr></table>",
        );
        let table = doc.select(&SEL_ALL_TABLES).next().expect("table");
        assert!(!is_navigation_table(table));
    }

    #[test]
    fn test_preceding_heading() {
        let doc = Html::parse_document(
            "<body><h3>Table 2. Activation peaks</h3><table><tr><td>x</td></tr></table></body>",
        );
        let table = doc.select(&SEL_ALL_TABLES).next().expect("table");
        let heading = preceding_heading(table).expect("heading");
        assert!(RE_HEADING_TABLE.is_match(&heading));
    }
}
