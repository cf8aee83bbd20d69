//! PLoS dialect: XML-flavored `<table-wrap>` containers inline in the
//! article HTML, numbered through their "Table N" labels.

use super::{first_text, number_from, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_TABLE_WRAP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table-wrap").expect("selector is compile-time constant"));

pub struct PlosSource {
    config: CompiledConfig,
}

impl PlosSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for PlosSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for wrap in doc.select(&SEL_TABLE_WRAP) {
            let Some(table) = table_in(wrap) else {
                continue;
            };
            let label = first_text(wrap, "label");
            blocks.push(TableBlock {
                table_html: table.html(),
                number: label.as_deref().and_then(number_from),
                caption: first_text(wrap, "title, caption"),
                notes: first_text(wrap, "table-wrap-foot"),
                label,
            });
        }
        blocks
    }
}
