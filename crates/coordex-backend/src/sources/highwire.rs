//! HighWire/Sage dialect.
//!
//! The article page only carries table stubs; each full table lives at
//! `{citation_public_url}/T{n}.expansion.html` and is fetched separately,
//! one HTTP request per table. The stub count comes from the
//! `.table-label` spans in the article body.

use super::{element_text, first_text, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::entities::decode_entities;
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_TABLE_LABEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("span.table-label").expect("selector is compile-time constant")
});
static SEL_EXPANSION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(".table-expansion").expect("selector is compile-time constant")
});

pub struct HighWireSource {
    config: CompiledConfig,
}

impl HighWireSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for HighWireSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let Some(base) = super::meta_content(doc, "citation_public_url") else {
            log::debug!("no citation_public_url; cannot locate table expansions");
            return Vec::new();
        };
        let n_tables = doc.select(&SEL_TABLE_LABEL).count();

        let mut blocks = Vec::new();
        for n in 1..=n_tables {
            let url = format!("{}/T{n}.expansion.html", base.trim_end_matches('/'));
            let body = match fetcher.fetch(&url) {
                Ok(body) => body,
                Err(e) => {
                    log::warn!("skipping table {n}: {e}");
                    continue;
                }
            };
            let body = decode_entities(&body, &self.config.entities);
            let fragment = Html::parse_document(&body);
            let Some(container) = fragment.select(&SEL_EXPANSION).next() else {
                log::warn!("no table expansion container in {url}");
                continue;
            };

            // The expansion page nests the table under an id like table-3.
            let table = Selector::parse(&format!("table#table-{n}"))
                .ok()
                .and_then(|sel| container.select(&sel).next())
                .or_else(|| table_in(container));
            let Some(table) = table else {
                continue;
            };

            blocks.push(TableBlock {
                table_html: table.html(),
                number: Some(n.to_string()),
                label: container.select(&SEL_TABLE_LABEL).next().map(element_text),
                caption: first_text(container, ".table-caption"),
                notes: first_text(container, ".table-footnotes"),
            });
        }
        blocks
    }
}
