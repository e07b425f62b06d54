//! PubMed search and record retrieval
//!
//! Builds Entrez queries from structured filters, talks to the E-utilities
//! ESearch and EFetch endpoints, and normalizes EFetch XML into flat
//! [`ArticleRecord`]s.

pub mod client;
pub mod models;
pub mod parser;
pub mod query;
pub(crate) mod responses;

// Re-export public types
pub use client::{CountOutcome, FetchOutcome, PubMedClient};
pub use models::ArticleRecord;
pub use parser::{pair_with_requested, parse_articles_from_xml};
pub use query::{JoinOperator, SearchFilters, parse_keywords};
