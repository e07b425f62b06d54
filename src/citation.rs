//! APA-like citation lines and BibTeX entries for article records

use crate::pubmed::models::{ArticleRecord, NO_AUTHORS};
use regex::Regex;
use std::sync::OnceLock;

/// Year placeholder when the publication date carries no recognizable year
pub const NO_YEAR: &str = "n.d.";

static YEAR_REGEX: OnceLock<Regex> = OnceLock::new();

fn year_regex() -> &'static Regex {
    YEAR_REGEX.get_or_init(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid year pattern"))
}

/// First 19xx/20xx year in a date string
pub fn extract_year(date: &str) -> Option<&str> {
    year_regex().find(date).map(|m| m.as_str())
}

/// `"A"`, `"A & B"`, `"A et al."`, or `"Unknown"` for an empty list
pub fn format_author_attribution(authors: &[String]) -> String {
    match authors {
        [] => "Unknown".to_string(),
        [only] => only.clone(),
        [first, second] => format!("{first} & {second}"),
        [first, ..] => format!("{first} et al."),
    }
}

/// Escape special BibTeX characters
fn escape_bibtex(s: &str) -> String {
    s.replace('&', r"\&")
        .replace('%', r"\%")
        .replace('$', r"\$")
        .replace('_', r"\_")
        .replace('#', r"\#")
        .replace('{', r"\{")
        .replace('}', r"\}")
}

/// Citation and BibTeX rendering for article records
pub trait Citation {
    /// `"{authors}. ({year}). {title}. {journal}. Retrieved from {url}"`
    fn citation(&self) -> String;

    /// Lowercased last name token of the first author followed by the year
    ///
    /// Only alphanumerics are kept. A missing year becomes `nd` and a missing
    /// author `unknown`.
    fn bibtex_key(&self) -> String;

    /// `@article` entry under the given key
    fn to_bibtex(&self, key: &str) -> String;
}

impl Citation for ArticleRecord {
    fn citation(&self) -> String {
        format!(
            "{}. ({}). {}. {}. Retrieved from {}",
            format_author_attribution(&self.authors),
            self.year().unwrap_or(NO_YEAR),
            self.title,
            self.journal,
            self.article_url
        )
    }

    fn bibtex_key(&self) -> String {
        let last_name = self
            .authors
            .first()
            .filter(|a| a.as_str() != NO_AUTHORS)
            .and_then(|a| a.split_whitespace().last())
            .unwrap_or("unknown");
        let year = self.year().unwrap_or("nd");

        format!("{last_name}{year}")
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect()
    }

    fn to_bibtex(&self, key: &str) -> String {
        let mut lines = vec![format!("@article{{{key},")];

        lines.push(format!("  title = {{{}}},", escape_bibtex(&self.title)));

        let authors: Vec<String> = self
            .authors
            .iter()
            .filter(|a| a.as_str() != NO_AUTHORS)
            .map(|a| escape_bibtex(a))
            .collect();
        if !authors.is_empty() {
            lines.push(format!("  author = {{{}}},", authors.join(" and ")));
        }

        lines.push(format!("  journal = {{{}}},", escape_bibtex(&self.journal)));
        if let Some(year) = self.year() {
            lines.push(format!("  year = {{{year}}},"));
        }
        if !self.keywords.is_empty() {
            lines.push(format!(
                "  keywords = {{{}}},",
                escape_bibtex(&self.keywords.join(", "))
            ));
        }
        lines.push(format!("  pmid = {{{}}},", self.pmid));
        lines.push(format!("  url = {{{}}}", self.article_url));
        lines.push("}".to_string());

        lines.join("\n")
    }
}
