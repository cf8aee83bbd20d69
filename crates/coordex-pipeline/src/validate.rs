//! Pre-ingest validation of raw article HTML.
//!
//! Scrapes routinely come back as interception pages: bot checks, error
//! pages, paywalls. Feeding those to the parser wastes time and can
//! produce garbage articles, so they are filtered on a handful of known
//! markers before anything else happens.

/// Markers that identify an intercepted or failed download rather than an
/// article. Matched case-insensitively against the raw HTML.
const INTERCEPTION_MARKERS: &[&str] = &[
    "403 forbidden",
    "404 not found",
    "page not available",
    "access denied",
    "checking your browser",
    "cf-browser-verification",
    "attention required! | cloudflare",
    "ddos protection by",
    "please enable cookies",
    "are you a robot",
    "captcha",
];

/// Check raw HTML for interception markers.
///
/// Returns `Err` with the offending marker when the document looks like an
/// interception page, `Ok(())` otherwise.
///
/// # Errors
/// Returns the matched marker string.
pub fn validate_html(html: &str) -> Result<(), &'static str> {
    let lower = html.to_lowercase();
    for marker in INTERCEPTION_MARKERS {
        if lower.contains(marker) {
            return Err(marker);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_article_passes() {
        assert!(validate_html("<html><body><h1>An fMRI study</h1></body></html>").is_ok());
    }

    #[test]
    fn test_cloudflare_page_rejected() {
        let html = "<html><title>Attention Required! | Cloudflare</title></html>";
        assert_eq!(validate_html(html), Err("attention required! | cloudflare"));
    }

    #[test]
    fn test_forbidden_page_rejected() {
        assert!(validate_html("<h1>403 Forbidden</h1>").is_err());
    }

    #[test]
    fn test_case_insensitive() {
        assert!(validate_html("ACCESS DENIED").is_err());
    }
}
