//! NeuroVault cross-reference harvesting.
//!
//! Articles increasingly link their statistical maps on NeuroVault. The
//! links are a side channel: they ride along on the Article record and are
//! not involved in table extraction.

use coordex_core::{NeurovaultKind, NeurovaultLink};
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

static RE_NEUROVAULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"neurovault\.org/(images?|collections?)/(\d+)")
        .expect("regex is compile-time constant")
});

static SEL_ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("selector is compile-time constant"));

/// Walk every `<a href>` in the document and collect typed NeuroVault
/// references, deduplicated in document order.
#[must_use]
pub fn harvest_neurovault_links(doc: &Html) -> Vec<NeurovaultLink> {
    let mut links: Vec<NeurovaultLink> = Vec::new();
    for anchor in doc.select(&SEL_ANCHOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(caps) = RE_NEUROVAULT.captures(href) else {
            continue;
        };
        let kind = if caps[1].starts_with("image") {
            NeurovaultKind::Image
        } else {
            NeurovaultKind::Collection
        };
        let link = NeurovaultLink {
            kind,
            id: caps[2].to_string(),
            url: href.to_string(),
        };
        if !links.contains(&link) {
            links.push(link);
        }
    }
    links
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_harvest_image_and_collection() {
        let doc = Html::parse_document(
            "<html><body>\
             <a href=\"https://neurovault.org/images/30211\">map</a>\
             <a href=\"https://neurovault.org/collections/1015/\">collection</a>\
             <a href=\"https://example.com/other\">other</a>\
             </body></html>",
        );
        let links = harvest_neurovault_links(&doc);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].kind, NeurovaultKind::Image);
        assert_eq!(links[0].id, "30211");
        assert_eq!(links[1].kind, NeurovaultKind::Collection);
        assert_eq!(links[1].id, "1015");
    }

    #[test]
    fn test_duplicates_collapsed() {
        let doc = Html::parse_document(
            "<body>\
             <a href=\"https://neurovault.org/images/7\">a</a>\
             <a href=\"https://neurovault.org/images/7\">b</a>\
             </body>",
        );
        assert_eq!(harvest_neurovault_links(&doc).len(), 1);
    }

    #[test]
    fn test_no_links() {
        let doc = Html::parse_document("<body><p>no links here</p></body>");
        assert!(harvest_neurovault_links(&doc).is_empty());
    }
}
