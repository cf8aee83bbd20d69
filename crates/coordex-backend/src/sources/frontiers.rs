//! Frontiers dialect: XML-flavored `<table-wrap id="T\d+">` containers
//! inline in the article HTML.

use super::{element_text, first_text, table_in, CompiledConfig, SourceDialect, TableBlock};
use crate::fetch::Fetcher;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static SEL_TABLE_WRAP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table-wrap").expect("selector is compile-time constant"));
static SEL_LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("label").expect("selector is compile-time constant"));
static RE_WRAP_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T(\d+)$").expect("regex is compile-time constant"));

pub struct FrontiersSource {
    config: CompiledConfig,
}

impl FrontiersSource {
    #[must_use]
    pub fn new(config: CompiledConfig) -> Self {
        Self { config }
    }
}

impl SourceDialect for FrontiersSource {
    fn config(&self) -> &CompiledConfig {
        &self.config
    }

    fn discover_tables(&self, doc: &Html, _fetcher: &dyn Fetcher) -> Vec<TableBlock> {
        let mut blocks = Vec::new();
        for wrap in doc.select(&SEL_TABLE_WRAP) {
            let Some(id) = wrap.value().attr("id") else {
                continue;
            };
            let Some(caps) = RE_WRAP_ID.captures(id) else {
                continue;
            };
            let Some(table) = table_in(wrap) else {
                continue;
            };
            blocks.push(TableBlock {
                table_html: table.html(),
                number: Some(caps[1].to_string()),
                label: wrap.select(&SEL_LABEL).next().map(element_text),
                caption: first_text(wrap, "caption, title"),
                notes: first_text(wrap, "table-wrap-foot"),
            });
        }
        blocks
    }
}
