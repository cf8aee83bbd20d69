//! Entity and code-point substitution applied before DOM parsing.
//!
//! Publishers ship coordinates wrapped in typographic minus signs,
//! non-breaking spaces, and a menagerie of dash code points. Replacing them
//! with ASCII equivalents up front means one pass over the document instead
//! of cleanup at every extraction site.

use std::borrow::Cow;

/// The process-wide baseline substitution table. Dialects may extend it
/// with their own entries; dialect entries take precedence.
pub const BASELINE_ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&minus;", "-"),
    ("\u{00a0}", " "), // non-breaking space
    ("\u{2212}", "-"), // unicode minus
    ("\u{2012}", "-"), // figure dash
    ("\u{2013}", "-"), // en dash
    ("\u{2014}", "-"), // em dash
    ("\u{2015}", "-"), // horizontal bar
    ("\u{0150}", "-"), // legacy dash seen in older article exports
    ("\u{8211}", "-"),
    ("\u{2018}", "'"), // smart quotes
    ("\u{2019}", "'"),
    ("\u{0145}", "'"),
    ("\u{0146}", "'"),
    ("\u{2009}", ""), // thin space
    ("\u{2007}", ""), // figure space
    ("\u{0160}", ""),
    ("\u{0177}", ""),
];

/// Replace baseline entities plus any dialect-specific extras.
///
/// This is a straight replacement table, not a grammar: applying it twice
/// equals applying it once, because no replacement value contains a key.
#[must_use]
pub fn decode_entities(html: &str, extra: &[(String, String)]) -> String {
    let mut result: Cow<'_, str> = Cow::Borrowed(html);
    for (key, replacement) in extra {
        if result.contains(key.as_str()) {
            result = Cow::Owned(result.replace(key.as_str(), replacement));
        }
    }
    for (key, replacement) in BASELINE_ENTITIES {
        if result.contains(key) {
            result = Cow::Owned(result.replace(key, replacement));
        }
    }
    result.into_owned()
}
