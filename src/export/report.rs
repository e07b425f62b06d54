//! Research report assembled from heading-prefixed paragraphs

use super::{ExportContext, bibliography};
use crate::error::Result;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tracing::debug;

pub const REPORT_TITLE: &str = "PubMed Research Report";

// A4 in points
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN: i64 = 56;

const TITLE_SIZE: i64 = 18;
const HEADING_SIZE: i64 = 13;
const BODY_SIZE: i64 = 10;
const TITLE_LEADING: i64 = 28;
const HEADING_LEADING: i64 = 20;
const BODY_LEADING: i64 = 14;

// Character budgets per line for Helvetica at the sizes above
const HEADING_WRAP: usize = 70;
const BODY_WRAP: usize = 95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportBlock {
    pub heading: String,
    pub body: String,
}

impl ReportBlock {
    pub fn new<H: Into<String>, B: Into<String>>(heading: H, body: B) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub blocks: Vec<ReportBlock>,
}

impl Report {
    /// Query, counts, any analysis, one block per article, then the references
    pub fn build(ctx: &ExportContext<'_>) -> Self {
        let mut blocks = vec![
            ReportBlock::new("Search Query", ctx.query),
            ReportBlock::new(
                "Results",
                format!(
                    "Total results in PubMed: {}\nArticles retrieved: {}\nGenerated: {}",
                    ctx.result_count,
                    ctx.articles.len(),
                    ctx.generated_on.format("%Y-%m-%d")
                ),
            ),
        ];

        if let Some(analysis) = ctx.analysis {
            blocks.push(ReportBlock::new("Key Findings", &analysis.key_findings));
            blocks.push(ReportBlock::new("Research Gaps", &analysis.research_gaps));
            blocks.push(ReportBlock::new(
                "Clinical Recommendations",
                &analysis.clinical_recommendations,
            ));
        }

        for (i, article) in ctx.articles.iter().enumerate() {
            let mut body = format!(
                "Authors: {}\nJournal: {}\nPublished: {}\nPMID: {}\nURL: {}",
                article.authors_joined(),
                article.journal,
                article.publication_date,
                article.pmid,
                article.article_url
            );
            if !article.keywords.is_empty() {
                body.push_str(&format!("\nKeywords: {}", article.keywords.join(", ")));
            }
            if let Some(summary) = ctx.summaries.get(&article.pmid) {
                body.push_str(&format!("\n\nSummary: {summary}"));
            }
            body.push_str(&format!("\n\nAbstract: {}", article.abstract_text));

            blocks.push(ReportBlock::new(format!("{}. {}", i + 1, article.title), body));
        }

        if !ctx.articles.is_empty() {
            blocks.push(ReportBlock::new("References", bibliography(ctx.articles)));
        }

        Self {
            title: REPORT_TITLE.to_string(),
            blocks,
        }
    }

    pub fn to_text(&self) -> String {
        let mut out = format!("{}\n{}\n\n", self.title, "=".repeat(self.title.chars().count()));
        for block in &self.blocks {
            out.push_str(&block.heading);
            out.push('\n');
            out.push_str(&"-".repeat(block.heading.chars().count()));
            out.push('\n');
            out.push_str(&block.body);
            out.push_str("\n\n");
        }
        out
    }

    /// Paginated A4 PDF using the standard Helvetica fonts
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        let lines = self.layout();
        let pages = paginate(&lines);

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let regular_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => regular_id,
                "F2" => bold_id,
            },
        });

        let mut kids = Vec::with_capacity(pages.len());
        for page in &pages {
            let content = page_content(page);
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::Reference(page_id));
        }

        let page_count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => Object::Integer(page_count),
                "Resources" => resources_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(PAGE_WIDTH),
                    Object::Integer(PAGE_HEIGHT),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.compress();

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;

        debug!(pages = page_count, bytes = buffer.len(), "Rendered PDF report");
        Ok(buffer)
    }

    fn layout(&self) -> Vec<Line> {
        let mut lines = Vec::new();
        for text in wrap(&self.title, HEADING_WRAP) {
            lines.push(Line::new(Style::Title, text));
        }

        for block in &self.blocks {
            lines.push(Line::blank());
            for text in wrap(&block.heading, HEADING_WRAP) {
                lines.push(Line::new(Style::Heading, text));
            }
            for paragraph in block.body.lines() {
                if paragraph.trim().is_empty() {
                    lines.push(Line::blank());
                    continue;
                }
                for text in wrap(paragraph, BODY_WRAP) {
                    lines.push(Line::new(Style::Body, text));
                }
            }
        }
        lines
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Title,
    Heading,
    Body,
}

impl Style {
    fn font(self) -> &'static str {
        match self {
            Style::Title | Style::Heading => "F2",
            Style::Body => "F1",
        }
    }

    fn size(self) -> i64 {
        match self {
            Style::Title => TITLE_SIZE,
            Style::Heading => HEADING_SIZE,
            Style::Body => BODY_SIZE,
        }
    }

    fn leading(self) -> i64 {
        match self {
            Style::Title => TITLE_LEADING,
            Style::Heading => HEADING_LEADING,
            Style::Body => BODY_LEADING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Line {
    style: Style,
    text: String,
}

impl Line {
    fn new(style: Style, text: String) -> Self {
        Self { style, text }
    }

    fn blank() -> Self {
        Self::new(Style::Body, String::new())
    }
}

/// Lines placed on pages as `(baseline y, line)`
fn paginate(lines: &[Line]) -> Vec<Vec<(i64, &Line)>> {
    let top = PAGE_HEIGHT - MARGIN;
    let mut pages: Vec<Vec<(i64, &Line)>> = vec![Vec::new()];
    let mut y = top;

    for line in lines {
        let leading = line.style.leading();
        if y - leading < MARGIN {
            pages.push(Vec::new());
            y = top;
        }
        y -= leading;

        // Blank lines at the top of a page only waste space
        if line.text.is_empty() && y == top - leading {
            y = top;
            continue;
        }
        if let Some(page) = pages.last_mut() {
            page.push((y, line));
        }
    }
    pages
}

fn page_content(page: &[(i64, &Line)]) -> Content {
    let mut operations = Vec::new();
    for (y, line) in page {
        if line.text.is_empty() {
            continue;
        }
        operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![line.style.font().into(), Object::Integer(line.style.size())],
            ),
            Operation::new("Td", vec![Object::Integer(MARGIN), Object::Integer(*y)]),
            Operation::new("Tj", vec![Object::string_literal(to_win_ansi(&line.text))]),
            Operation::new("ET", vec![]),
        ]);
    }
    Content { operations }
}

/// Encode for the standard fonts' `WinAnsiEncoding`; unmapped characters become `?`
fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\t' => b' ',
            '\u{20AC}' => 0x80,
            '\u{2026}' => 0x85,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            ' '..='~' | '\u{A0}'..='\u{FF}' => c as u8,
            _ => b'?',
        })
        .collect()
}

/// Greedy word wrap; words longer than `width` are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
