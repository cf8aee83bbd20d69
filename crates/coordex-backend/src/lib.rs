//! # Coordex Backend - Table Extraction Engine
//!
//! Parses the HTML full text of neuroimaging journal articles into
//! [`Article`](coordex_core::Article) records carrying stereotactic
//! activation coordinates.
//!
//! # Architecture
//!
//! ```text
//! raw html
//!    │ SourceRegistry::identify          (identifier regex per dialect)
//!    ▼
//! SourceDialect::parse via sources::parse_article
//!    │ decode_entities → DOM → PMID/DOI → metadata → text/space tag
//!    ▼
//! discover_tables                        (dialect-specific; may Fetch)
//!    │ per table node
//!    ▼
//! grid::build_grid                       (rowspan/colspan → dense grid)
//!    ▼
//! tableparser::parse_table
//!    ├─ columns::identify_standard_columns
//!    ├─ groups::identify_repeating_groups
//!    └─ activation::build_activation     (+ validation)
//! ```
//!
//! Two to three dozen publisher dialects share this one pipeline; a dialect
//! only decides where tables and identifiers live in its DOM. The fallback
//! [`DefaultSource`](sources::DefaultSource) applies multi-strategy
//! heuristic discovery for everything else.
//!
//! The engine does no I/O of its own: auxiliary HTML (per-table fragments
//! on HighWire and Springer, linked tables) goes through the injected
//! [`Fetcher`](fetch::Fetcher), and PubMed lookups go through the
//! [`MetadataResolver`](pubmed::MetadataResolver) /
//! [`DoiResolver`](pubmed::DoiResolver) collaborators.

pub mod activation;
pub mod columns;
pub mod entities;
pub mod fetch;
pub mod grid;
pub mod groups;
pub mod neurovault;
pub mod pubmed;
pub mod sources;
pub mod space;
pub mod tableparser;
pub mod text;

pub use activation::build_activation;
pub use columns::{identify_standard_columns, StandardColumn};
pub use entities::decode_entities;
pub use fetch::{Fetcher, HttpFetcher};
pub use grid::{build_grid, Grid, GridCell};
pub use groups::{identify_repeating_groups, GroupSpan};
pub use neurovault::harvest_neurovault_links;
pub use pubmed::{parse_medline, DoiResolver, EntrezClient, MetadataResolver};
pub use sources::{parse_article, ParseContext, SourceDialect, SourceRegistry, TableBlock};
pub use space::guess_space;
pub use tableparser::parse_table;
