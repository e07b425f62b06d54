//! Persona and prompt templates for each analysis operation
//!
//! Prompts are deterministic functions of their inputs: the same articles in
//! the same order always yield the same text.

use crate::pubmed::models::ArticleRecord;
use std::fmt::Write;

/// Character ceiling requested from abstract summaries
pub const SUMMARY_MAX_CHARS: usize = 300;

pub const SUMMARIZER_SYSTEM_PROMPT: &str = "You are a medical research summarizer. Create concise, accurate summaries that capture the key findings and implications.";

pub const RESEARCH_ASSISTANT_SYSTEM_PROMPT: &str = "You are a medical research assistant. Provide factual, accurate answers based only on the provided medical literature. Be clear about limitations when information is insufficient.";

pub const ANALYST_SYSTEM_PROMPT: &str = "You are a medical research analyst. Identify key findings and patterns across multiple research articles.";

pub const STRATEGIST_SYSTEM_PROMPT: &str = "You are a medical research strategist. Identify important gaps in the current research landscape.";

pub const CONSULTANT_SYSTEM_PROMPT: &str = "You are a medical research consultant. Provide evidence-based clinical recommendations based on research findings.";

pub fn build_summary_prompt(abstract_text: &str) -> String {
    format!(
        "Summarize the following medical abstract in about 2-3 sentences (maximum {SUMMARY_MAX_CHARS} characters):\n\n{abstract_text}"
    )
}

/// Numbered title and abstract blocks, one per article
fn title_abstract_context(articles: &[ArticleRecord]) -> String {
    let mut context = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = write!(
            context,
            "Article {}: {}\nAbstract: {}\n\n",
            i + 1,
            article.title,
            article.abstract_text
        );
    }
    context
}

/// Title and abstract blocks extended with authors and publication details
fn full_context(articles: &[ArticleRecord]) -> String {
    let mut context = String::new();
    for (i, article) in articles.iter().enumerate() {
        let _ = write!(
            context,
            "Article {}: {}\nAbstract: {}\nAuthors: {}\nPublication: {}, {}\n\n",
            i + 1,
            article.title,
            article.abstract_text,
            article.authors_joined(),
            article.journal,
            article.publication_date
        );
    }
    context
}

pub fn build_question_prompt(question: &str, articles: &[ArticleRecord]) -> String {
    format!(
        "Based on these medical research articles, please answer the following question:\n\n\
         Context articles:\n{}\n\n\
         Question: {question}\n\n\
         Answer the question factually based only on the information provided in these articles. \
         If the articles don't contain relevant information to answer the question, clearly state \
         that it cannot be answered from the provided context.",
        full_context(articles)
    )
}

pub fn build_key_findings_prompt(articles: &[ArticleRecord]) -> String {
    format!(
        "Analyze these medical research articles and identify the 3-5 most important findings or trends across them:\n\n\
         {}\n\n\
         Format your response as bullet points, focusing on clinically relevant insights and consensus findings.",
        title_abstract_context(articles)
    )
}

pub fn build_research_gaps_prompt(articles: &[ArticleRecord]) -> String {
    format!(
        "Based on these medical research articles, identify 2-4 important research gaps or unanswered questions:\n\n\
         {}\n\n\
         Format your response as bullet points, focusing on clinically relevant gaps that future research should address.",
        title_abstract_context(articles)
    )
}

pub fn build_clinical_recommendations_prompt(articles: &[ArticleRecord]) -> String {
    format!(
        "Based on these medical research articles, suggest 3-4 evidence-based clinical recommendations:\n\n\
         {}\n\n\
         Format your response as bullet points with brief explanations, focusing on practical \
         applications for clinicians. Be clear about the strength of evidence.",
        title_abstract_context(articles)
    )
}
