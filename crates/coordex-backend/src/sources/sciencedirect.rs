//! ScienceDirect (Elsevier) dialect.
//!
//! Two generations of markup are in circulation: the current `div.tables`
//! containers and the legacy `dl.table` definition lists with a
//! `data-label` attribute. Both are inline; no fetching.

use super::{first_text, number_from, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SEL_MODERN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.tables").expect("selector is compile-time constant"));
static SEL_LEGACY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("dl.table").expect("selector is compile-time constant"));

pub struct ScienceDirectSource {
    config: CompiledConfig,
}

impl ScienceDirectSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }

    fn block_from(container: ElementRef<'_>) -> Option<TableBlock> {
        let table = table_in(container)?;
        let label = first_text(container, ".label, span.label");
        // Legacy containers carry the printed label in data-label.
        let number = container
            .value()
            .attr("data-label")
            .and_then(number_from)
            .or_else(|| label.as_deref().and_then(number_from));
        Some(TableBlock {
            table_html: table.html(),
            number,
            label,
            caption: first_text(container, "p.caption, .captions, .caption"),
            notes: first_text(container, ".tblFootnote, .legend"),
        })
    }
}

impl SourceDialect for ScienceDirectSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let modern: Vec<TableBlock> = doc
            .select(&SEL_MODERN)
            .filter_map(Self::block_from)
            .collect();
        if !modern.is_empty() {
            return modern;
        }
        doc.select(&SEL_LEGACY)
            .filter_map(Self::block_from)
            .collect()
    }
}
