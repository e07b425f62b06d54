//! Raw per-article fields collected while reading, and their projection into `ArticleRecord`

use super::preprocessing::normalize_whitespace;
use crate::pubmed::models::{
    ArticleRecord, MESH_KEYWORD_LIMIT, NO_ABSTRACT, NO_AUTHORS, NO_DATE, NO_TITLE,
    UNKNOWN_JOURNAL,
};

#[derive(Debug, Default, Clone)]
pub(crate) struct AuthorName {
    pub last_name: String,
    pub fore_name: String,
    pub initials: String,
    pub collective_name: String,
}

impl AuthorName {
    /// Display name, or `None` when no name part was present
    pub fn display_name(&self) -> Option<String> {
        let collective = normalize_whitespace(&self.collective_name);
        if !collective.is_empty() {
            return Some(collective);
        }

        let last = normalize_whitespace(&self.last_name);
        if last.is_empty() {
            return None;
        }

        let fore = normalize_whitespace(&self.fore_name);
        let initials = normalize_whitespace(&self.initials);
        if !fore.is_empty() {
            Some(format!("{fore} {last}"))
        } else if !initials.is_empty() {
            Some(format!("{initials} {last}"))
        } else {
            Some(last)
        }
    }
}

#[derive(Debug, Default, Clone)]
pub(crate) struct DateParts {
    pub year: String,
    pub month: String,
    pub day: String,
    pub medline_date: String,
}

impl DateParts {
    /// `"Month Day, Year"`, `"Month Year"`, `"Year"`, then the free-text MedlineDate
    pub fn format(&self) -> Option<String> {
        let year = normalize_whitespace(&self.year);
        let month = normalize_whitespace(&self.month);
        let day = normalize_whitespace(&self.day);

        if !year.is_empty() {
            return Some(match (month.is_empty(), day.is_empty()) {
                (false, false) => format!("{month} {day}, {year}"),
                (false, true) => format!("{month} {year}"),
                _ => year,
            });
        }

        let medline = normalize_whitespace(&self.medline_date);
        (!medline.is_empty()).then_some(medline)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct AbstractSection {
    pub label: Option<String>,
    pub text: String,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct ArticleBuilder {
    pub pmid: String,
    pub title: Option<String>,
    pub has_abstract: bool,
    pub abstract_sections: Vec<AbstractSection>,
    pub abstract_loose_text: String,
    pub authors: Vec<AuthorName>,
    pub journal_title: Option<String>,
    pub journal_iso: Option<String>,
    pub pub_date: Option<DateParts>,
    pub article_date: Option<DateParts>,
    pub keywords: Vec<String>,
    pub mesh_descriptors: Vec<String>,
}

impl ArticleBuilder {
    /// PMID read from `MedlineCitation/PMID`, if any
    pub fn pmid(&self) -> Option<String> {
        let pmid = self.pmid.trim();
        (!pmid.is_empty()).then(|| pmid.to_string())
    }

    pub fn into_record(self, pmid: &str) -> ArticleRecord {
        let title = self
            .title
            .as_deref()
            .map(normalize_whitespace)
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| NO_TITLE.to_string());

        let abstract_text = self.format_abstract();

        let mut authors: Vec<String> = self
            .authors
            .iter()
            .filter_map(AuthorName::display_name)
            .collect();
        if authors.is_empty() {
            authors.push(NO_AUTHORS.to_string());
        }

        let journal = [&self.journal_title, &self.journal_iso]
            .into_iter()
            .flatten()
            .map(|j| normalize_whitespace(j))
            .find(|j| !j.is_empty())
            .unwrap_or_else(|| UNKNOWN_JOURNAL.to_string());

        let publication_date = self
            .pub_date
            .as_ref()
            .and_then(DateParts::format)
            .or_else(|| self.article_date.as_ref().and_then(DateParts::format))
            .unwrap_or_else(|| NO_DATE.to_string());

        let mut keywords: Vec<String> = self
            .keywords
            .iter()
            .map(|k| normalize_whitespace(k))
            .filter(|k| !k.is_empty())
            .collect();
        if keywords.is_empty() {
            keywords = self
                .mesh_descriptors
                .iter()
                .map(|d| normalize_whitespace(d))
                .filter(|d| !d.is_empty())
                .take(MESH_KEYWORD_LIMIT)
                .collect();
        }

        ArticleRecord {
            pmid: pmid.to_string(),
            title,
            abstract_text,
            authors,
            publication_date,
            journal,
            keywords,
            article_url: ArticleRecord::url_for(pmid),
        }
    }

    fn format_abstract(&self) -> String {
        if !self.has_abstract {
            return NO_ABSTRACT.to_string();
        }

        let text = if self.abstract_sections.is_empty() {
            normalize_whitespace(&self.abstract_loose_text)
        } else {
            let mut text = String::new();
            for section in &self.abstract_sections {
                if let Some(label) = section.label.as_deref().filter(|l| !l.is_empty()) {
                    text.push_str(label);
                    text.push_str(": ");
                }
                text.push_str(&normalize_whitespace(&section.text));
                text.push(' ');
            }
            text
        };

        if text.trim().is_empty() {
            NO_ABSTRACT.to_string()
        } else {
            text
        }
    }
}
