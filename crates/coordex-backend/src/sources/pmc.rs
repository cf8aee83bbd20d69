//! PubMed Central dialect: inline `div.table-wrap` containers; the PMID is
//! always present as `citation_pmid`.

use super::{first_text, number_from, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_TABLE_WRAP: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("div.table-wrap").expect("selector is compile-time constant")
});

pub struct PmcSource {
    config: CompiledConfig,
}

impl PmcSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for PmcSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for wrap in doc.select(&SEL_TABLE_WRAP) {
            let Some(table) = table_in(wrap) else {
                continue;
            };
            let label = first_text(wrap, ".label, h3, h4");
            blocks.push(TableBlock {
                table_html: table.html(),
                number: label.as_deref().and_then(number_from),
                caption: first_text(wrap, ".caption p, .caption"),
                notes: first_text(wrap, ".tw-foot, tfoot"),
                label,
            });
        }
        blocks
    }
}
