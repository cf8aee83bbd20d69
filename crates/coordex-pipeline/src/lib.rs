//! # Coordex Pipeline - Batch Article Ingestion
//!
//! Drives the extraction engine over directories of article HTML:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Stage 1 (parallel): read file → validate HTML → identify    │
//! │ source                                                      │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Stage 2 (parallel): parse article (grid → table →           │
//! │ activations)                                                │
//! └─────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Stage 3 (sequential): persist via ArticleStore, periodic    │
//! │ flush                                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stages 1 and 2 are embarrassingly parallel over articles and run on a
//! rayon worker pool; the registry and collaborator handles are read-only
//! and shared. The store is owned exclusively by the calling thread.

pub mod ingest;
pub mod store;
pub mod validate;

pub use ingest::{IngestOptions, IngestSummary, Ingestor, SkipReason};
pub use store::{ArticleStore, MemoryStore};
pub use validate::validate_html;
