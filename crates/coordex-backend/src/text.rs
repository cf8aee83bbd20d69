//! Best-effort article text cleanup for persistence and space tagging.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static SEL_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("body").expect("selector is compile-time constant"));

/// Extract the article's readable text: scripts, styles and templates are
/// dropped, everything else is concatenated with whitespace collapsed.
#[must_use]
pub fn extract_text(doc: &Html) -> String {
    let mut out = String::new();
    if let Some(body) = doc.select(&SEL_BODY).next() {
        collect(body, &mut out);
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn collect(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            out.push(' ');
        } else if let Some(e) = ElementRef::wrap(child) {
            if matches!(e.value().name(), "script" | "style" | "noscript" | "template") {
                continue;
            }
            collect(e, out);
        }
    }
}
