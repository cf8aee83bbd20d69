//! Wiley dialect: inline `div.table` containers with ids like `t1` or
//! `tbl2`; footnotes live in the table's own `<tfoot>`.

use super::{element_text, first_text, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_DIV_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.table").expect("selector is compile-time constant"));
static SEL_CAPTION: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("header, .article-table-caption").expect("selector is compile-time constant")
});
static RE_TABLE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^t(?:bl)?(\d+)$").expect("regex is compile-time constant"));

pub struct WileySource {
    config: CompiledConfig,
}

impl WileySource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for WileySource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for wrap in doc.select(&SEL_DIV_TABLE) {
            let Some(caps) = wrap
                .value()
                .attr("id")
                .and_then(|id| RE_TABLE_ID.captures(id))
            else {
                continue;
            };
            let Some(table) = table_in(wrap) else {
                continue;
            };
            let number = caps[1].to_string();
            blocks.push(TableBlock {
                table_html: table.html(),
                label: Some(format!("Table {number}")),
                number: Some(number),
                caption: wrap.select(&SEL_CAPTION).next().map(element_text),
                notes: first_text(wrap, "tfoot, .article-table-content-footnotes"),
            });
        }
        blocks
    }
}
