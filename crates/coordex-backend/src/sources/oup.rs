//! Oxford University Press dialect: inline `div.table-full-width-wrap`
//! containers, minus the duplicated modal copies.

use super::{first_text, number_from, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_WRAP: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.table-full-width-wrap").expect("selector is compile-time constant")
});

pub struct OupSource {
    config: CompiledConfig,
}

impl OupSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for OupSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for wrap in doc.select(&SEL_WRAP) {
            // Each table appears twice: inline and inside a pop-out modal.
            let is_modal = wrap
                .value()
                .attr("class")
                .is_some_and(|c| c.contains("table-modal"));
            if is_modal {
                continue;
            }
            let Some(table) = table_in(wrap) else {
                continue;
            };
            let label = first_text(wrap, ".label, .table-label, span.label");
            blocks.push(TableBlock {
                table_html: table.html(),
                number: label.as_deref().and_then(number_from),
                caption: first_text(wrap, ".caption, .graphic-wrap + div"),
                notes: first_text(wrap, ".footnote, .fn, tfoot"),
                label,
            });
        }
        blocks
    }
}
