//! PubMed query construction from structured search filters

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AssistantError;

/// Boolean operator placed between query clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JoinOperator {
    #[default]
    And,
    Or,
}

impl JoinOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinOperator::And => "AND",
            JoinOperator::Or => "OR",
        }
    }
}

impl fmt::Display for JoinOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinOperator {
    type Err = AssistantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(JoinOperator::And),
            "OR" => Ok(JoinOperator::Or),
            other => Err(AssistantError::InvalidInput {
                message: format!("unknown operator '{other}', expected AND or OR"),
            }),
        }
    }
}

/// Structured search filters turned into one Entrez query string
///
/// # Example
///
/// ```
/// use pubmed_assistant::pubmed::{JoinOperator, SearchFilters};
///
/// let query = SearchFilters::new()
///     .keywords(&["treatment", "therapy"])
///     .disease("diabetes")
///     .years(2018, 2024)
///     .build();
///
/// assert_eq!(
///     query,
///     r#"("treatment" "therapy") AND ("diabetes"[MeSH Terms] OR "diabetes"[All Fields]) AND (2018[PDAT]:2024[PDAT])"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub keywords: Vec<String>,
    pub disease: Option<String>,
    pub year_range: Option<(i32, i32)>,
    pub author: Option<String>,
    pub journal: Option<String>,
    pub operator: JoinOperator,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add keywords; blank entries are ignored at build time
    pub fn keywords<S: AsRef<str>>(mut self, keywords: &[S]) -> Self {
        self.keywords
            .extend(keywords.iter().map(|k| k.as_ref().to_string()));
        self
    }

    /// Add keywords from a comma-separated list such as `"treatment, therapy"`
    pub fn keyword_list(mut self, input: &str) -> Self {
        self.keywords.extend(parse_keywords(input));
        self
    }

    pub fn disease<S: Into<String>>(mut self, disease: S) -> Self {
        self.disease = Some(disease.into());
        self
    }

    /// Restrict to a publication-year range (inclusive)
    pub fn years(mut self, start_year: i32, end_year: i32) -> Self {
        self.year_range = Some((start_year, end_year));
        self
    }

    pub fn author<S: Into<String>>(mut self, author: S) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn journal<S: Into<String>>(mut self, journal: S) -> Self {
        self.journal = Some(journal.into());
        self
    }

    pub fn operator(mut self, operator: JoinOperator) -> Self {
        self.operator = operator;
        self
    }

    /// Build the final query string
    ///
    /// Returns an empty string when no clause could be produced; callers treat
    /// that as "nothing to search".
    pub fn build(&self) -> String {
        let mut parts = Vec::new();

        let keywords: Vec<String> = self
            .keywords
            .iter()
            .filter_map(|k| quoted(k))
            .collect();
        if !keywords.is_empty() {
            parts.push(format!("({})", keywords.join(" ")));
        }

        if let Some(disease) = self.disease.as_deref().and_then(quoted) {
            parts.push(format!("({disease}[MeSH Terms] OR {disease}[All Fields])"));
        }

        if let Some((start, end)) = self.year_range {
            let (start, end) = if start <= end { (start, end) } else { (end, start) };
            parts.push(format!("({start}[PDAT]:{end}[PDAT])"));
        }

        if let Some(author) = self.author.as_deref().and_then(quoted) {
            parts.push(format!("{author}[Author]"));
        }

        if let Some(journal) = self.journal.as_deref().and_then(quoted) {
            parts.push(format!("{journal}[Journal]"));
        }

        parts.join(&format!(" {} ", self.operator))
    }
}

/// Split comma-separated user input into trimmed, non-empty keywords
pub fn parse_keywords(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

/// Wrap a value in double quotes, dropping embedded quotes so the clause stays balanced
fn quoted(value: &str) -> Option<String> {
    let cleaned: String = value.chars().filter(|c| *c != '"').collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(format!("\"{cleaned}\""))
    }
}
