//! Export formats for a set of search results
//!
//! - **CSV** / **JSON** - one flat row per article, including any cached summary
//! - **Bibliography** - citation lines separated by blank lines
//! - **BibTeX** - `@article` entries with collision-free keys
//! - **Report** - heading-prefixed paragraphs, as plain text or PDF

pub mod report;

use crate::analysis::Analysis;
use crate::citation::Citation;
use crate::error::{AssistantError, Result};
use crate::pubmed::models::ArticleRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use report::{Report, ReportBlock};

/// Column order shared by the CSV and JSON exports
pub const EXPORT_COLUMNS: [&str; 8] = [
    "Title",
    "Authors",
    "Journal",
    "Publication Date",
    "Abstract",
    "Summary",
    "PMID",
    "URL",
];

/// One exported article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Authors")]
    pub authors: String,
    #[serde(rename = "Journal")]
    pub journal: String,
    #[serde(rename = "Publication Date")]
    pub publication_date: String,
    #[serde(rename = "Abstract")]
    pub abstract_text: String,
    #[serde(rename = "Summary")]
    pub summary: String,
    #[serde(rename = "PMID")]
    pub pmid: String,
    #[serde(rename = "URL")]
    pub url: String,
}

impl ExportRow {
    pub fn new(article: &ArticleRecord, summary: Option<&str>) -> Self {
        Self {
            title: article.title.clone(),
            authors: article.authors_joined(),
            journal: article.journal.clone(),
            publication_date: article.publication_date.clone(),
            abstract_text: article.abstract_text.clone(),
            summary: summary.unwrap_or_default().to_string(),
            pmid: article.pmid.clone(),
            url: article.article_url.clone(),
        }
    }
}

/// Output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
    Bibliography,
    Bibtex,
    Text,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 6] = [
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Bibliography,
        ExportFormat::Bibtex,
        ExportFormat::Text,
        ExportFormat::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Bibliography => "bibliography",
            ExportFormat::Bibtex => "bibtex",
            ExportFormat::Text => "text",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// Suggested file name for a download
    pub fn default_file_name(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "pubmed_search_results.csv",
            ExportFormat::Json => "pubmed_search_results.json",
            ExportFormat::Bibliography => "bibliography.txt",
            ExportFormat::Bibtex => "references.bib",
            ExportFormat::Text => "research_report.txt",
            ExportFormat::Pdf => "research_report.pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Json => "application/json",
            ExportFormat::Bibliography | ExportFormat::Text => "text/plain",
            ExportFormat::Bibtex => "application/x-bibtex",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "bibliography" | "citations" => Ok(ExportFormat::Bibliography),
            "bibtex" | "bib" => Ok(ExportFormat::Bibtex),
            "text" | "txt" | "report" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(AssistantError::InvalidInput {
                message: format!(
                    "unsupported export format '{other}'; use csv, json, bibliography, bibtex, text or pdf"
                ),
            }),
        }
    }
}

/// Everything an export may draw on
#[derive(Debug, Clone, Copy)]
pub struct ExportContext<'a> {
    pub query: &'a str,
    pub result_count: u64,
    pub articles: &'a [ArticleRecord],
    pub summaries: &'a HashMap<String, String>,
    pub analysis: Option<&'a Analysis>,
    pub generated_on: NaiveDate,
}

impl ExportContext<'_> {
    pub fn rows(&self) -> Vec<ExportRow> {
        self.articles
            .iter()
            .map(|a| ExportRow::new(a, self.summaries.get(&a.pmid).map(String::as_str)))
            .collect()
    }

    /// Render the export in `format`
    pub fn render(&self, format: ExportFormat) -> Result<Vec<u8>> {
        debug!(%format, articles = self.articles.len(), "Rendering export");
        match format {
            ExportFormat::Csv => to_csv(&self.rows()),
            ExportFormat::Json => Ok(to_json(&self.rows())?.into_bytes()),
            ExportFormat::Bibliography => Ok(bibliography(self.articles).into_bytes()),
            ExportFormat::Bibtex => Ok(articles_to_bibtex(self.articles).into_bytes()),
            ExportFormat::Text => Ok(Report::build(self).to_text().into_bytes()),
            ExportFormat::Pdf => Report::build(self).to_pdf(),
        }
    }
}

/// CSV with a header row, present even when there are no rows
pub fn to_csv(rows: &[ExportRow]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(EXPORT_COLUMNS)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| AssistantError::IoError(e.into_error()))
}

pub fn to_json(rows: &[ExportRow]) -> Result<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Citation lines joined by a blank line
pub fn bibliography(articles: &[ArticleRecord]) -> String {
    articles
        .iter()
        .map(Citation::citation)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// BibTeX entries; repeated keys get `a`, `b`, ... suffixes in order of appearance
pub fn articles_to_bibtex(articles: &[ArticleRecord]) -> String {
    let base_keys: Vec<String> = articles.iter().map(Citation::bibtex_key).collect();

    let mut totals: HashMap<&str, usize> = HashMap::new();
    for key in &base_keys {
        *totals.entry(key.as_str()).or_default() += 1;
    }

    let mut used: HashSet<String> = HashSet::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut entries = Vec::with_capacity(articles.len());

    for (article, base) in articles.iter().zip(&base_keys) {
        let key = if totals[base.as_str()] > 1 {
            let index = seen.entry(base.as_str()).or_default();
            let mut candidate;
            loop {
                candidate = format!("{base}{}", suffix(*index));
                *index += 1;
                if !used.contains(&candidate) {
                    break;
                }
            }
            candidate
        } else {
            base.clone()
        };
        used.insert(key.clone());
        entries.push(article.to_bibtex(&key));
    }

    entries.join("\n\n")
}

/// `a`..`z`, then `aa`, `ab`, ...
fn suffix(mut index: usize) -> String {
    let mut letters = Vec::new();
    loop {
        letters.push((b'a' + (index % 26) as u8) as char);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    letters.iter().rev().collect()
}
