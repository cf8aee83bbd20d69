//! The persistence seam.
//!
//! The pipeline emits value objects; whatever stores them implements
//! [`ArticleStore`]. A relational adapter lives outside this crate; the
//! in-memory implementation here backs tests and small extractions.

use coordex_core::{Article, Result};

/// Narrow persistence interface the ingestor writes through.
pub trait ArticleStore {
    /// Stage an article for persistence.
    ///
    /// # Errors
    /// Propagates adapter failures; a store error aborts the ingest run.
    fn add(&mut self, article: Article) -> Result<()>;

    /// Flush staged articles to durable storage.
    ///
    /// # Errors
    /// Propagates adapter failures.
    fn save(&mut self) -> Result<()>;

    /// Whether an article with this PMID is already stored.
    fn article_exists(&self, pmid: u32) -> bool;

    /// Remove an article (used when overwriting).
    ///
    /// # Errors
    /// Propagates adapter failures.
    fn delete_article(&mut self, pmid: u32) -> Result<()>;
}

/// In-memory store preserving insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    flushes: usize,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored articles, in insertion order.
    #[must_use]
    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    /// Number of times `save` has been called (flush accounting for
    /// tests).
    #[must_use]
    pub const fn flushes(&self) -> usize {
        self.flushes
    }
}

impl ArticleStore for MemoryStore {
    fn add(&mut self, article: Article) -> Result<()> {
        self.articles.push(article);
        Ok(())
    }

    fn save(&mut self) -> Result<()> {
        self.flushes += 1;
        Ok(())
    }

    fn article_exists(&self, pmid: u32) -> bool {
        self.articles.iter().any(|a| a.pmid == pmid)
    }

    fn delete_article(&mut self, pmid: u32) -> Result<()> {
        self.articles.retain(|a| a.pmid != pmid);
        Ok(())
    }
}
