//! # PubMed Research Assistant
//!
//! Searches PubMed from structured filters, normalizes the returned records,
//! and uses an OpenAI-compatible chat-completion API to summarize articles,
//! answer questions about them, and synthesize findings across a result set.
//!
//! ## Features
//!
//! - **Query building**: keywords, disease, year range, author and journal filters
//! - **Resilient retrieval**: count and article fetches degrade to notices, never panics
//! - **Analysis**: per-article summaries, key findings, research gaps, clinical recommendations, Q&A
//! - **Exports**: CSV, JSON, bibliography, BibTeX, and text or PDF reports
//! - **Session handlers**: explicit state passed through search, summarize, analyze and ask
//!
//! ## Quick Start
//!
//! ```no_run
//! use pubmed_assistant::{
//!     Analyst, ChatClient, LlmConfig, PubMedClient, ResearchAssistant, SearchFilters,
//!     SearchRequest, SessionState,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let analyst = Analyst::new(ChatClient::new(LlmConfig::from_env()?)?);
//!     let assistant = ResearchAssistant::new(PubMedClient::new()?, analyst);
//!
//!     let filters = SearchFilters::new()
//!         .keyword_list("treatment, therapy")
//!         .disease("asthma")
//!         .years(2020, 2024);
//!
//!     let (state, report) = assistant
//!         .search(SessionState::new(), SearchRequest::new(filters))
//!         .await;
//!     let report = report?;
//!     println!("{} results for {}", report.result_count, report.query);
//!
//!     let (_state, answer) = assistant.ask(state, "Which therapies work best?").await;
//!     println!("{}", answer?);
//!
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod citation;
pub mod config;
pub mod demo;
pub mod error;
pub mod export;
pub mod llm;
pub mod notice;
pub mod pubmed;
pub mod samples;
pub mod session;

// Re-export main types for convenience
pub use analysis::{Analysis, Analyst};
pub use citation::{Citation, extract_year};
pub use config::{ClientConfig, LlmConfig};
pub use error::{AssistantError, Result};
pub use export::{ExportContext, ExportFormat, ExportRow, Report};
pub use llm::ChatClient;
pub use notice::{Notice, NoticeLevel};
pub use pubmed::{
    ArticleRecord, CountOutcome, FetchOutcome, JoinOperator, PubMedClient, SearchFilters,
    parse_keywords,
};
pub use samples::{SAMPLE_SEARCHES, SampleSearch};
pub use session::{
    AnalysisOutput, ResearchAssistant, ResultMetrics, SearchReport, SearchRequest, SessionState,
    SummaryOutput,
};
