use thiserror::Error;

/// Error types for research assistant operations
#[derive(Error, Debug)]
pub enum AssistantError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    /// XML parsing failed
    #[error("XML parsing failed: {0}")]
    XmlError(String),

    /// ESearch returned a count that is not an integer
    #[error("Invalid result count: {value}")]
    InvalidCount { value: String },

    /// Article is not part of the current result set
    #[error("Article not found: PMID {pmid}")]
    ArticleNotFound { pmid: String },

    /// No search clause could be built from the filters
    #[error("Please enter at least keywords or a disease to search")]
    EmptyQuery,

    /// User input rejected before any request was made
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// Operation needs a non-empty article list
    #[error("No articles loaded; run a search first")]
    NoArticles,

    /// Chat completion response carried no text
    #[error("Chat completion returned no content")]
    EmptyCompletion,

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic API error
    #[error("API error: {message}")]
    ApiError { message: String },

    /// CSV export failed
    #[error("CSV export failed: {0}")]
    CsvError(#[from] csv::Error),

    /// PDF rendering failed
    #[error("PDF rendering failed: {0}")]
    PdfError(#[from] lopdf::Error),

    /// File I/O failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AssistantError>;
