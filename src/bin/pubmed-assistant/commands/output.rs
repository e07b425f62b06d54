use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use pubmed_assistant::{
    Analysis, ArticleRecord, Citation, ExportFormat, Notice, NoticeLevel, SearchReport,
    SessionState,
};

/// Route degradation notices through the log so they share the spinner-aware writer
pub fn emit_notices(notices: &[Notice]) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => tracing::info!("{}", notice.message),
            NoticeLevel::Warning => tracing::warn!("{}", notice.message),
            NoticeLevel::Error => tracing::error!("{}", notice.message),
        }
    }
}

pub fn print_search_report(report: &SearchReport, state: &SessionState) -> Result<()> {
    emit_notices(&report.notices);

    let metrics = state.metrics();
    let mut out = std::io::stdout().lock();
    writeln!(out, "Query: {}", report.query)?;
    writeln!(out, "Total articles: {}", metrics.total_results)?;
    writeln!(
        out,
        "Most recent year: {}",
        metrics
            .most_recent_year
            .map_or_else(|| "-".to_string(), |y| y.to_string())
    )?;
    writeln!(out, "Avg. authors per study: {:.1}", metrics.average_authors)?;
    if report.demonstration {
        writeln!(out, "(showing demonstration data)")?;
    }
    writeln!(out)?;

    for (i, article) in state.articles.iter().enumerate() {
        print_article(&mut out, i + 1, article, state.summaries.get(&article.pmid))?;
    }
    Ok(())
}

pub fn print_article(
    out: &mut impl Write,
    index: usize,
    article: &ArticleRecord,
    summary: Option<&String>,
) -> Result<()> {
    writeln!(out, "{index}. {}", article.title)?;
    writeln!(out, "   Journal: {}", article.journal)?;
    writeln!(out, "   Published: {}", article.publication_date)?;
    writeln!(out, "   Authors: {}", article.authors_joined())?;
    writeln!(out, "   PMID: {}  {}", article.pmid, article.article_url)?;
    if !article.keywords.is_empty() {
        writeln!(out, "   Keywords: {}", article.keywords.join(", "))?;
    }
    if let Some(summary) = summary {
        writeln!(out, "   Summary: {summary}")?;
    }
    writeln!(out)?;
    Ok(())
}

pub fn print_analysis(analysis: &Analysis) -> Result<()> {
    let mut out = std::io::stdout().lock();
    writeln!(out, "Key Findings\n{}\n", analysis.key_findings)?;
    writeln!(out, "Research Gaps\n{}\n", analysis.research_gaps)?;
    writeln!(out, "Clinical Recommendations\n{}\n", analysis.clinical_recommendations)?;
    Ok(())
}

pub fn print_citation(article: &ArticleRecord) -> Result<()> {
    writeln!(std::io::stdout(), "{}", article.citation())?;
    Ok(())
}

/// Render `format` and write it to `path`, or to the format's default file name
pub fn write_export(state: &SessionState, format: ExportFormat, path: Option<&Path>) -> Result<()> {
    let bytes = state
        .export(format)
        .with_context(|| format!("Failed to render {format} export"))?;
    let path = path.unwrap_or_else(|| Path::new(format.default_file_name()));

    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        articles = state.articles.len(),
        "Exported {} articles as {}",
        state.articles.len(),
        format
    );
    Ok(())
}
