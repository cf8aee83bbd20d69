//! Error types for coordinate-extraction operations.
//!
//! The variants map onto the failure kinds the pipeline distinguishes:
//! article-level failures (`InvalidHtml`, `NoSourceMatch`,
//! `MissingIdentifier`) cause the article to be skipped; table- and
//! row-level failures (`FetchFailed`, `MalformedRow`, `MissingLabel`) are
//! local and leave the rest of the article intact; `Persistence` aborts the
//! run.

use thiserror::Error;

/// Error type shared by every coordex crate.
#[derive(Error, Debug)]
pub enum CoordexError {
    /// Raw HTML failed pre-ingest validation (interception page, error
    /// page, paywall stub). The offending marker is included.
    #[error("invalid article HTML: {0}")]
    InvalidHtml(String),

    /// No registered source dialect matched the article HTML.
    #[error("no registered source matches the article HTML")]
    NoSourceMatch,

    /// No PMID was supplied, present in the document, or resolvable from a
    /// DOI. Articles without a PMID cannot be keyed and are skipped.
    #[error("no PMID present or resolvable for article")]
    MissingIdentifier,

    /// An auxiliary HTML fetch (per-table fragment, linked table) failed
    /// after retries. Only the affected table is lost.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A table row declared structurally impossible spans. Skipped when
    /// [`ParseOptions::ignore_bad_rows`](crate::ParseOptions) is set.
    #[error("malformed table row: {0}")]
    MalformedRow(String),

    /// A column label could not be identified for a table.
    #[error("missing column label: {0}")]
    MissingLabel(String),

    /// The persistence adapter failed; aborts the ingest run.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// File I/O error (input HTML, metadata cache, table cache).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error (metadata cache, dialect configuration).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Wrapped parser error from a lower layer.
    #[error("parser error: {0}")]
    Parser(#[from] anyhow::Error),
}

/// Convenience alias for [`Result<T, CoordexError>`].
pub type Result<T> = std::result::Result<T, CoordexError>;
