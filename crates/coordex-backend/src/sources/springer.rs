//! Springer dialect.
//!
//! Tables are served from `{citation_fulltext_html_url}/tables/{n}`, one
//! request per table; the article page links each with a "Full size table"
//! span.

use super::{element_text, first_text, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::entities::decode_entities;
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("selector is compile-time constant"));
static SEL_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("selector is compile-time constant"));

pub struct SpringerSource {
    config: CompiledConfig,
}

impl SpringerSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for SpringerSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let Some(base) = super::meta_content(doc, "citation_fulltext_html_url") else {
            log::debug!("no citation_fulltext_html_url; cannot locate tables");
            return Vec::new();
        };
        let n_tables = doc
            .select(&SEL_SPAN)
            .filter(|s| element_text(*s).contains("Full size table"))
            .count();

        let mut blocks = Vec::new();
        for n in 1..=n_tables {
            let url = format!("{}/tables/{n}", base.trim_end_matches('/'));
            let body = match fetcher.fetch(&url) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("skipping table {n}: {e}");
                    continue;
                }
            };
            let body = decode_entities(&body, &self.config.entities);
            let fragment = Html::parse_document(&body);
            let Some(page) = fragment.select(&SEL_BODY).next() else {
                continue;
            };
            let Some(table) = table_in(page) else {
                log::warn!("no table in {url}");
                continue;
            };
            blocks.push(TableBlock {
                table_html: table.html(),
                number: Some(n.to_string()),
                label: Some(format!("Table {n}")),
                caption: first_text(page, ".Caption, .CaptionContent, h1"),
                notes: first_text(page, ".Footnotes, .TableFooter, tfoot"),
            });
        }
        blocks
    }
}
