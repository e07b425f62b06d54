//! PubMed EFetch XML parser
//!
//! Reads a `<PubmedArticleSet>` with a streaming quick-xml reader and projects
//! every `<PubmedArticle>` into a flat [`ArticleRecord`], applying the field
//! fallbacks defined in [`crate::pubmed::models`].
//!
//! Records are paired with the requested PMIDs by the identifier each record
//! carries, never by position.

mod builder;
mod preprocessing;

use crate::error::{AssistantError, Result};
use crate::pubmed::models::ArticleRecord;
use builder::{AbstractSection, ArticleBuilder, AuthorName, DateParts};
use preprocessing::strip_inline_html_tags;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;
use tracing::{debug, instrument, warn};

/// Parse every article in an EFetch response
///
/// Articles without a `MedlineCitation/PMID` cannot be attributed and are
/// skipped with a warning.
///
/// # Example
///
/// ```
/// use pubmed_assistant::pubmed::parse_articles_from_xml;
///
/// let xml = r#"<PubmedArticleSet>
///   <PubmedArticle>
///     <MedlineCitation>
///       <PMID>12345678</PMID>
///       <Article>
///         <ArticleTitle>Example Article</ArticleTitle>
///         <Journal><Title>Example Journal</Title></Journal>
///       </Article>
///     </MedlineCitation>
///   </PubmedArticle>
/// </PubmedArticleSet>"#;
///
/// let articles = parse_articles_from_xml(xml).unwrap();
/// assert_eq!(articles[0].title, "Example Article");
/// assert_eq!(articles[0].abstract_text, "No abstract available");
/// ```
#[instrument(skip(xml), fields(xml_size = xml.len()))]
pub fn parse_articles_from_xml(xml: &str) -> Result<Vec<ArticleRecord>> {
    let builders = read_article_set(xml)?;

    let records: Vec<ArticleRecord> = builders
        .into_iter()
        .enumerate()
        .filter_map(|(position, builder)| match builder.pmid() {
            Some(pmid) => Some(builder.into_record(&pmid)),
            None => {
                warn!(position, "Article without PMID in EFetch response, skipping");
                None
            }
        })
        .collect();

    debug!(articles = records.len(), "Completed XML parsing");
    Ok(records)
}

/// Order parsed records by the requested PMID list
///
/// Records whose PMID was not requested are dropped, duplicates keep the
/// first occurrence, and requested PMIDs with no record are logged.
pub fn pair_with_requested(records: Vec<ArticleRecord>, requested: &[String]) -> Vec<ArticleRecord> {
    let mut by_pmid: HashMap<String, ArticleRecord> = HashMap::with_capacity(records.len());

    for record in records {
        if !requested.iter().any(|id| id == &record.pmid) {
            warn!(pmid = %record.pmid, "EFetch returned an unrequested article, skipping");
            continue;
        }
        by_pmid.entry(record.pmid.clone()).or_insert(record);
    }

    requested
        .iter()
        .filter_map(|pmid| {
            let record = by_pmid.remove(pmid);
            if record.is_none() {
                warn!(pmid = %pmid, "No record returned for requested PMID");
            }
            record
        })
        .collect()
}

/// Where the current text run belongs
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    Pmid,
    Title,
    AbstractSection,
    AbstractLoose,
    LastName,
    ForeName,
    Initials,
    CollectiveName,
    JournalTitle,
    JournalIso,
    Year,
    Month,
    Day,
    MedlineDate,
    Keyword,
    Descriptor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum DateSlot {
    PubDate,
    ArticleDate,
}

#[derive(Default)]
struct ReaderState {
    stack: Vec<String>,
    articles: Vec<ArticleBuilder>,
    current: Option<ArticleBuilder>,
    // Per-article "first occurrence only" guards
    abstract_done: bool,
    author_list_done: bool,
    journal_done: bool,
    date_slot: Option<DateSlot>,
    author: Option<AuthorName>,
    section: Option<AbstractSection>,
    keyword: String,
    descriptor: String,
    in_abstract: bool,
    in_author_list: bool,
    in_journal: bool,
    in_mesh_heading: bool,
}

impl ReaderState {
    fn parent(&self) -> Option<&str> {
        self.stack.len().checked_sub(2).map(|i| self.stack[i].as_str())
    }

    fn within(&self, name: &str) -> bool {
        self.stack.iter().any(|n| n == name)
    }

    fn start(&mut self, element: &BytesStart<'_>, name: &str) -> Result<()> {
        self.stack.push(name.to_string());

        if name == "PubmedArticle" {
            self.begin_article();
            return Ok(());
        }
        if self.current.is_none() {
            return Ok(());
        }

        match name {
            "Abstract" if !self.abstract_done => {
                self.in_abstract = true;
                if let Some(article) = self.current.as_mut() {
                    article.has_abstract = true;
                }
            }
            "AbstractText" if self.in_abstract => {
                self.section = Some(AbstractSection {
                    label: label_attribute(element)?,
                    text: String::new(),
                });
            }
            "AuthorList" if !self.author_list_done => self.in_author_list = true,
            "Author" if self.in_author_list => self.author = Some(AuthorName::default()),
            "Journal" if !self.journal_done => self.in_journal = true,
            "PubDate" if self.in_journal => self.date_slot = Some(DateSlot::PubDate),
            "ArticleDate"
                if self
                    .current
                    .as_ref()
                    .is_some_and(|a| a.article_date.is_none()) =>
            {
                self.date_slot = Some(DateSlot::ArticleDate)
            }
            "Keyword" => self.keyword.clear(),
            "MeshHeading" => self.in_mesh_heading = true,
            "DescriptorName" if self.in_mesh_heading => self.descriptor.clear(),
            _ => {}
        }
        Ok(())
    }

    fn empty(&mut self, element: &BytesStart<'_>, name: &str) -> Result<()> {
        // `<AbstractText Label="X"/>` still contributes its label
        if name == "AbstractText" && self.in_abstract {
            let label = label_attribute(element)?;
            if let Some(article) = self.current.as_mut() {
                article.abstract_sections.push(AbstractSection {
                    label,
                    text: String::new(),
                });
            }
        } else if name == "Abstract" && !self.abstract_done {
            if let Some(article) = self.current.as_mut() {
                article.has_abstract = true;
            }
            self.abstract_done = true;
        }
        Ok(())
    }

    fn end(&mut self, name: &str) {
        match name {
            "PubmedArticle" => self.finish_article(),
            "Abstract" if self.in_abstract => {
                self.in_abstract = false;
                self.abstract_done = true;
            }
            "AbstractText" => {
                if let (Some(section), Some(article)) = (self.section.take(), self.current.as_mut()) {
                    article.abstract_sections.push(section);
                }
            }
            "AuthorList" if self.in_author_list => {
                self.in_author_list = false;
                self.author_list_done = true;
            }
            "Author" => {
                if let (Some(author), Some(article)) = (self.author.take(), self.current.as_mut()) {
                    article.authors.push(author);
                }
            }
            "Journal" if self.in_journal => {
                self.in_journal = false;
                self.journal_done = true;
            }
            "PubDate" | "ArticleDate" => self.date_slot = None,
            "Keyword" => {
                if let Some(article) = self.current.as_mut() {
                    article.keywords.push(std::mem::take(&mut self.keyword));
                }
            }
            "MeshHeading" => self.in_mesh_heading = false,
            "DescriptorName" if self.in_mesh_heading => {
                if let Some(article) = self.current.as_mut() {
                    article
                        .mesh_descriptors
                        .push(std::mem::take(&mut self.descriptor));
                }
            }
            _ => {}
        }
        self.stack.pop();
    }

    fn target(&self) -> Option<Target> {
        self.current.as_ref()?;
        let top = self.stack.last()?.as_str();

        if top == "PMID" && self.parent() == Some("MedlineCitation") {
            return Some(Target::Pmid);
        }
        if self.within("ArticleTitle") {
            return Some(Target::Title);
        }
        if self.in_abstract {
            return Some(if self.section.is_some() {
                Target::AbstractSection
            } else {
                Target::AbstractLoose
            });
        }
        if self.author.is_some() {
            return match top {
                "LastName" => Some(Target::LastName),
                "ForeName" => Some(Target::ForeName),
                "Initials" => Some(Target::Initials),
                "CollectiveName" => Some(Target::CollectiveName),
                _ => None,
            };
        }
        if self.date_slot.is_some() {
            return match top {
                "Year" => Some(Target::Year),
                "Month" => Some(Target::Month),
                "Day" => Some(Target::Day),
                "MedlineDate" => Some(Target::MedlineDate),
                _ => None,
            };
        }
        if self.in_journal && self.parent() == Some("Journal") {
            return match top {
                "Title" => Some(Target::JournalTitle),
                "ISOAbbreviation" => Some(Target::JournalIso),
                _ => None,
            };
        }
        match top {
            "Keyword" if self.parent() == Some("KeywordList") => Some(Target::Keyword),
            "DescriptorName" if self.in_mesh_heading => Some(Target::Descriptor),
            _ => None,
        }
    }

    fn text(&mut self, text: &str) {
        let Some(target) = self.target() else {
            return;
        };
        let date_slot = self.date_slot;
        let Some(article) = self.current.as_mut() else {
            return;
        };

        let slot: &mut String = match target {
            Target::Pmid => &mut article.pmid,
            Target::Title => article.title.get_or_insert_with(String::new),
            Target::AbstractSection => match self.section.as_mut() {
                Some(section) => &mut section.text,
                None => return,
            },
            Target::AbstractLoose => &mut article.abstract_loose_text,
            Target::LastName | Target::ForeName | Target::Initials | Target::CollectiveName => {
                let Some(author) = self.author.as_mut() else {
                    return;
                };
                match target {
                    Target::LastName => &mut author.last_name,
                    Target::ForeName => &mut author.fore_name,
                    Target::Initials => &mut author.initials,
                    _ => &mut author.collective_name,
                }
            }
            Target::JournalTitle => article.journal_title.get_or_insert_with(String::new),
            Target::JournalIso => article.journal_iso.get_or_insert_with(String::new),
            Target::Year | Target::Month | Target::Day | Target::MedlineDate => {
                let parts = match date_slot {
                    Some(DateSlot::PubDate) => article.pub_date.get_or_insert_with(DateParts::default),
                    Some(DateSlot::ArticleDate) => {
                        article.article_date.get_or_insert_with(DateParts::default)
                    }
                    None => return,
                };
                match target {
                    Target::Year => &mut parts.year,
                    Target::Month => &mut parts.month,
                    Target::Day => &mut parts.day,
                    _ => &mut parts.medline_date,
                }
            }
            Target::Keyword => &mut self.keyword,
            Target::Descriptor => &mut self.descriptor,
        };
        slot.push_str(text);
    }

    fn begin_article(&mut self) {
        if self.current.is_some() {
            warn!("Nested PubmedArticle element, discarding the unfinished article");
        }
        self.current = Some(ArticleBuilder::default());
        self.abstract_done = false;
        self.author_list_done = false;
        self.journal_done = false;
        self.date_slot = None;
        self.author = None;
        self.section = None;
        self.in_abstract = false;
        self.in_author_list = false;
        self.in_journal = false;
        self.in_mesh_heading = false;
    }

    fn finish_article(&mut self) {
        if let Some(article) = self.current.take() {
            self.articles.push(article);
        }
    }
}

fn label_attribute(element: &BytesStart<'_>) -> Result<Option<String>> {
    for attr in element.attributes().flatten() {
        if attr.key.as_ref() == b"Label" {
            let value = attr
                .unescape_value()
                .map_err(|e| AssistantError::XmlError(format!("Invalid Label attribute: {e}")))?;
            let value = value.trim();
            return Ok((!value.is_empty()).then(|| value.to_string()));
        }
    }
    Ok(None)
}

fn read_article_set(xml: &str) -> Result<Vec<ArticleBuilder>> {
    let cleaned = strip_inline_html_tags(xml);
    let mut reader = Reader::from_str(&cleaned);
    reader.config_mut().trim_text(false);

    let mut state = ReaderState::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                state.start(e, &name)?;
            }
            Ok(Event::Empty(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                state.empty(e, &name)?;
            }
            Ok(Event::End(ref e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                state.end(&name);
            }
            Ok(Event::Text(e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| AssistantError::XmlError(format!("Failed to decode XML text: {e}")))?;
                state.text(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                state.text(&text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(AssistantError::XmlError(format!(
                    "XML parsing error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    if state.current.is_some() {
        return Err(AssistantError::XmlError(
            "Unterminated PubmedArticle element".to_string(),
        ));
    }

    Ok(state.articles)
}
