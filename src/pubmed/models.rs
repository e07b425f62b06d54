use serde::{Deserialize, Serialize};

pub const NO_TITLE: &str = "No title";
pub const NO_ABSTRACT: &str = "No abstract available";
pub const NO_AUTHORS: &str = "No authors listed";
pub const NO_DATE: &str = "No date";
pub const UNKNOWN_JOURNAL: &str = "Unknown Journal";

/// Maximum number of MeSH descriptors used when an article lists no keywords
pub const MESH_KEYWORD_LIMIT: usize = 5;

/// One PubMed article, flattened for display, prompting and export
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ArticleRecord {
    /// PubMed ID
    pub pmid: String,
    /// Article title
    pub title: String,
    /// Abstract text; structured abstracts are flattened to `"Label: text "` sections
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Display names in citation order
    pub authors: Vec<String>,
    /// Best-effort human readable date
    pub publication_date: String,
    /// Journal name
    pub journal: String,
    /// Author keywords, or MeSH descriptors when none were given
    pub keywords: Vec<String>,
    /// Link to the PubMed landing page
    pub article_url: String,
}

impl ArticleRecord {
    /// Landing page URL for a PMID
    pub fn url_for(pmid: &str) -> String {
        format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/")
    }

    /// Authors joined by `", "`
    pub fn authors_joined(&self) -> String {
        self.authors.join(", ")
    }

    /// First four-digit group in the publication date that looks like a year
    pub fn year(&self) -> Option<&str> {
        crate::citation::extract_year(&self.publication_date)
    }
}
