//! PubMed collaborators: metadata resolution and DOI-to-PMID lookup.
//!
//! Metadata arrives in MEDLINE text format (`TI  - ...` field records) from
//! the Entrez efetch endpoint. Parsing is offline-testable; the HTTP side
//! lives behind the same [`Fetcher`](crate::fetch::Fetcher) abstraction as
//! table fragments, and results are cached per PMID as JSON when a cache
//! directory is provided.

use crate::fetch::Fetcher;
use coordex_core::PubmedMetadata;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

const EUTILS_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

static RE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^([A-Z]+)\s*-\s+(.*)$").expect("regex is compile-time constant")
});
static RE_CONTINUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s+").expect("regex is compile-time constant"));
static RE_ESEARCH_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<Id>(\d+)</Id>").expect("regex is compile-time constant"));

/// Resolves a PMID to article metadata. Implementations may return `None`;
/// the parse tolerates articles without metadata.
pub trait MetadataResolver: Send + Sync {
    fn metadata(&self, pmid: &str) -> Option<PubmedMetadata>;
}

/// Resolves a DOI to a PMID for sources whose HTML carries no PMID.
pub trait DoiResolver: Send + Sync {
    fn pmid_from_doi(&self, doi: &str) -> Option<String>;
}

/// Parse MEDLINE-format metadata text into a [`PubmedMetadata`] record.
///
/// Repeated fields are joined with `"; "`. The DOI is pulled from the `AID`
/// entries; the year is the first token of `DP`. Returns `None` when the
/// record has no PMID or title.
#[must_use]
pub fn parse_medline(text: &str) -> Option<PubmedMetadata> {
    // Fold continuation lines back into their field before matching.
    let folded = RE_CONTINUATION.replace_all(text, " ");

    let mut fields: Vec<(String, String)> = Vec::new();
    for caps in RE_FIELD.captures_iter(&folded) {
        let key = caps[1].to_string();
        let value = caps[2].trim().to_string();
        if let Some((_, existing)) = fields.iter_mut().find(|(k, _)| *k == key) {
            existing.push_str("; ");
            existing.push_str(&value);
        } else {
            fields.push((key, value));
        }
    }
    let get = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    let pmid = get("PMID");
    let title = get("TI");
    if pmid.is_empty() || title.is_empty() {
        return None;
    }

    let doi = get("AID")
        .split("; ")
        .find(|entry| entry.contains("doi"))
        .and_then(|entry| entry.split(' ').next())
        .unwrap_or_default()
        .to_string();
    let year = get("DP")
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string();

    Some(PubmedMetadata {
        pmid,
        title,
        journal: get("JT"),
        year,
        authors: get("AU").replace(';', ","),
        abstract_text: get("AB"),
        mesh: get("MH"),
        citation: get("SO"),
        doi,
    })
}

/// Entrez-backed resolver for metadata and DOI lookups.
pub struct EntrezClient<F: Fetcher> {
    fetcher: F,
    cache_dir: Option<PathBuf>,
}

impl<F: Fetcher> EntrezClient<F> {
    /// Wrap a fetcher; no caching.
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            cache_dir: None,
        }
    }

    /// Read metadata through `<cache_dir>/<pmid>.json` before querying
    /// PubMed, and write query results back on a miss.
    #[must_use = "returns a client with the metadata cache configured"]
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    fn cache_path(&self, pmid: &str) -> Option<PathBuf> {
        self.cache_dir
            .as_deref()
            .map(|dir| dir.join(format!("{pmid}.json")))
    }

    fn read_cache(path: &Path) -> Option<PubmedMetadata> {
        let raw = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&raw).ok()
    }

    fn write_cache(path: &Path, meta: &PubmedMetadata) {
        let Ok(json) = serde_json::to_string_pretty(meta) else {
            return;
        };
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return;
            }
        }
        if let Err(e) = std::fs::write(path, json) {
            log::warn!("could not write metadata cache {}: {e}", path.display());
        }
    }
}

impl<F: Fetcher> MetadataResolver for EntrezClient<F> {
    fn metadata(&self, pmid: &str) -> Option<PubmedMetadata> {
        if let Some(path) = self.cache_path(pmid) {
            if let Some(cached) = Self::read_cache(&path) {
                log::debug!("metadata cache hit for PMID {pmid}");
                return Some(cached);
            }
        }

        log::info!("retrieving metadata for PubMed article {pmid}");
        let url = format!(
            "{EUTILS_BASE}/efetch.fcgi?db=pubmed&id={pmid}&retmode=text&rettype=medline"
        );
        let body = match self.fetcher.fetch(&url) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("metadata fetch failed for PMID {pmid}: {e}");
                return None;
            }
        };
        let meta = parse_medline(&body)?;
        if let Some(path) = self.cache_path(pmid) {
            Self::write_cache(&path, &meta);
        }
        Some(meta)
    }
}

impl<F: Fetcher> DoiResolver for EntrezClient<F> {
    fn pmid_from_doi(&self, doi: &str) -> Option<String> {
        let url = format!("{EUTILS_BASE}/esearch.fcgi?db=pubmed&term={doi}[aid]");
        let body = match self.fetcher.fetch(&url) {
            Ok(body) => body,
            Err(e) => {
                log::warn!("DOI lookup failed for {doi}: {e}");
                return None;
            }
        };
        RE_ESEARCH_ID
            .captures(&body)
            .map(|caps| caps[1].to_string())
    }
}
