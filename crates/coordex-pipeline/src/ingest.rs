//! Three-stage batch ingestion.

use crate::store::ArticleStore;
use crate::validate::validate_html;
use coordex_backend::sources::{parse_article, ParseContext, SourceRegistry};
use coordex_core::{Article, CoordexError, Result};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Options controlling a batch ingest run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Parse with the fallback source when no dialect matches. When off,
    /// unmatched articles are skipped.
    pub force_ingest: bool,

    /// Replace articles that already exist in the store. When off,
    /// existing articles are skipped, which makes re-runs cheap.
    pub overwrite: bool,

    /// Persist articles even when no activation table was extracted.
    pub save_without_activations: bool,

    /// Treat each file's basename as its PMID. Skips per-article
    /// identifier extraction and makes the duplicate check possible before
    /// parsing.
    pub pmid_filenames: bool,

    /// Worker-pool size for the read/identify and parse stages. `None`
    /// uses the global rayon pool.
    pub num_workers: Option<usize>,

    /// Flush the store after every N added articles. Zero disables
    /// periodic flushing (a final flush always happens).
    pub flush_every: usize,
}

impl IngestOptions {
    #[inline]
    #[must_use = "returns options with force-ingest configured"]
    pub const fn with_force_ingest(mut self, enable: bool) -> Self {
        self.force_ingest = enable;
        self
    }

    #[inline]
    #[must_use = "returns options with overwrite configured"]
    pub const fn with_overwrite(mut self, enable: bool) -> Self {
        self.overwrite = enable;
        self
    }

    #[inline]
    #[must_use = "returns options with empty-article handling configured"]
    pub const fn with_save_without_activations(mut self, enable: bool) -> Self {
        self.save_without_activations = enable;
        self
    }

    #[inline]
    #[must_use = "returns options with PMID-filename handling configured"]
    pub const fn with_pmid_filenames(mut self, enable: bool) -> Self {
        self.pmid_filenames = enable;
        self
    }

    #[inline]
    #[must_use = "returns options with the worker count configured"]
    pub const fn with_num_workers(mut self, workers: Option<usize>) -> Self {
        self.num_workers = workers;
        self
    }

    #[inline]
    #[must_use = "returns options with the flush interval configured"]
    pub const fn with_flush_every(mut self, n: usize) -> Self {
        self.flush_every = n;
        self
    }
}

impl Default for IngestOptions {
    #[inline]
    fn default() -> Self {
        Self {
            force_ingest: true,
            overwrite: false,
            save_without_activations: false,
            pmid_filenames: false,
            num_workers: None,
            flush_every: 100,
        }
    }
}

/// Why a file did not produce a stored article.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be read.
    ReadFailed(String),
    /// The HTML matched an interception marker.
    InvalidHtml(String),
    /// No dialect matched and force-ingest was off.
    NoSourceMatch,
    /// The article is already stored and overwrite is off.
    AlreadyExists,
    /// Parsing failed (no PMID, malformed rows under strict options, ...).
    ParseFailed(String),
    /// Parsing succeeded but no activation table was extracted.
    NoActivations,
}

/// Outcome of a batch ingest run.
#[derive(Debug, Default)]
pub struct IngestSummary {
    /// Articles handed to the store.
    pub added: usize,
    /// Files that produced no stored article, with the reason.
    pub skipped: Vec<(PathBuf, SkipReason)>,
}

/// Batch ingestor: shared read-only registry and collaborators, exclusive
/// store access on the calling thread.
pub struct Ingestor<'a> {
    registry: &'a SourceRegistry,
    ctx: ParseContext<'a>,
}

impl<'a> Ingestor<'a> {
    #[must_use]
    pub fn new(registry: &'a SourceRegistry, ctx: ParseContext<'a>) -> Self {
        Self { registry, ctx }
    }

    /// Process article files and hand the extracted articles to `store`.
    ///
    /// The two parallel stages run on the worker pool; the store is only
    /// ever touched from the calling thread.
    ///
    /// # Errors
    /// Store failures abort the run and propagate. Everything below the
    /// article level is local: it is logged, recorded in the summary, and
    /// does not stop the batch.
    pub fn add_articles(
        &self,
        store: &mut dyn ArticleStore,
        files: &[PathBuf],
        options: &IngestOptions,
    ) -> Result<IngestSummary> {
        let pool = match options.num_workers {
            Some(workers) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .map_err(|e| CoordexError::Parser(anyhow::anyhow!("worker pool: {e}")))?,
            ),
            None => None,
        };
        let in_pool = |work: &(dyn Fn() -> Vec<(PathBuf, StageOutcome)> + Sync)| match &pool {
            Some(pool) => pool.install(work),
            None => work(),
        };

        let mut summary = IngestSummary::default();

        // Stage 1: read, validate, identify.
        let scans = in_pool(&|| self.scan_stage(files));

        // Rule out what we can before parsing; the store may only be
        // consulted here, on the calling thread.
        let mut to_parse = Vec::new();
        for (path, scan) in scans {
            let (html, source_name) = match scan {
                StageOutcome::Scanned(html, source_name) => (html, source_name),
                StageOutcome::Skipped(reason) => {
                    summary.skipped.push((path, reason));
                    continue;
                }
                StageOutcome::Parsed(_) => unreachable!("stage 1 never parses"),
            };
            let pmid = options
                .pmid_filenames
                .then(|| pmid_from_path(&path))
                .flatten();
            if let Some(pmid) = pmid {
                if store.article_exists(pmid) && !options.overwrite {
                    summary.skipped.push((path, SkipReason::AlreadyExists));
                    continue;
                }
            }
            if source_name.is_none() && !options.force_ingest {
                log::warn!("could not identify source for {}", path.display());
                summary.skipped.push((path, SkipReason::NoSourceMatch));
                continue;
            }
            to_parse.push(ParseJob {
                path,
                html,
                source_name,
                pmid,
            });
        }

        // Stage 2: parse, in parallel over articles.
        let parsed = in_pool(&|| self.parse_stage(&to_parse));

        // Stage 3: persist, sequentially, flushing every N additions.
        for (path, outcome) in parsed {
            let article = match outcome {
                StageOutcome::Parsed(article) => article,
                StageOutcome::Skipped(reason) => {
                    summary.skipped.push((path, reason));
                    continue;
                }
                StageOutcome::Scanned(..) => unreachable!("stage 2 never scans"),
            };
            if article.tables.is_empty() && !options.save_without_activations {
                summary.skipped.push((path, SkipReason::NoActivations));
                continue;
            }
            if store.article_exists(article.pmid) {
                if options.overwrite {
                    store.delete_article(article.pmid)?;
                } else {
                    summary.skipped.push((path, SkipReason::AlreadyExists));
                    continue;
                }
            }
            store.add(article)?;
            summary.added += 1;
            if options.flush_every > 0 && summary.added % options.flush_every == 0 {
                store.save()?;
            }
        }
        store.save()?;

        Ok(summary)
    }

    fn scan_stage(&self, files: &[PathBuf]) -> Vec<(PathBuf, StageOutcome)> {
        files
            .par_iter()
            .map(|path| {
                let html = match std::fs::read(path) {
                    Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                    Err(e) => {
                        log::warn!("failed to read {}: {e}", path.display());
                        return (
                            path.clone(),
                            StageOutcome::Skipped(SkipReason::ReadFailed(e.to_string())),
                        );
                    }
                };
                if let Err(marker) = validate_html(&html) {
                    log::warn!("invalid HTML for {}: {marker}", path.display());
                    return (
                        path.clone(),
                        StageOutcome::Skipped(SkipReason::InvalidHtml(marker.to_string())),
                    );
                }
                let source = self.registry.identify(&html).map(|s| s.name().to_string());
                (path.clone(), StageOutcome::Scanned(html, source))
            })
            .collect()
    }

    fn parse_stage(&self, jobs: &[ParseJob]) -> Vec<(PathBuf, StageOutcome)> {
        jobs.par_iter()
            .map(|job| {
                log::info!("processing article {}", job.path.display());
                let dialect = job
                    .source_name
                    .as_deref()
                    .and_then(|name| self.registry.get(name))
                    .unwrap_or_else(|| self.registry.fallback());
                let pmid_string = job.pmid.map(|p| p.to_string());
                let outcome =
                    match parse_article(dialect, &job.html, pmid_string.as_deref(), &self.ctx) {
                        Ok(article) => StageOutcome::Parsed(article),
                        Err(e) => {
                            log::warn!("error parsing article {}: {e}", job.path.display());
                            StageOutcome::Skipped(SkipReason::ParseFailed(e.to_string()))
                        }
                    };
                (job.path.clone(), outcome)
            })
            .collect()
    }
}

/// What a pipeline stage produced for one file.
enum StageOutcome {
    /// Stage 1: raw HTML plus the identified source name.
    Scanned(String, Option<String>),
    /// Stage 2: a parsed article.
    Parsed(Article),
    /// Either stage: the file is out with this reason.
    Skipped(SkipReason),
}

/// Work item between stage 1 and stage 2.
struct ParseJob {
    path: PathBuf,
    html: String,
    source_name: Option<String>,
    pmid: Option<u32>,
}

fn pmid_from_path(path: &Path) -> Option<u32> {
    path.file_stem()?.to_str()?.parse().ok()
}
