//! Per-article summaries and cross-article synthesis
//!
//! Each operation has a strict `try_*` form returning a typed error and a
//! plain form that logs the failure and returns a fixed apology string.

use crate::error::{AssistantError, Result};
use crate::llm::ChatClient;
use crate::llm::prompts::{
    ANALYST_SYSTEM_PROMPT, CONSULTANT_SYSTEM_PROMPT, RESEARCH_ASSISTANT_SYSTEM_PROMPT,
    STRATEGIST_SYSTEM_PROMPT, SUMMARIZER_SYSTEM_PROMPT, build_clinical_recommendations_prompt,
    build_key_findings_prompt, build_question_prompt, build_research_gaps_prompt,
    build_summary_prompt,
};
use crate::pubmed::models::ArticleRecord;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const SUMMARY_FAILED: &str = "Summary generation failed. Please try again later.";
pub const QUESTION_FAILED: &str = "Question answering failed. Please try again later.";
pub const ANALYSIS_FAILED: &str = "Analysis failed. Please try again later.";

/// The three cross-article syntheses produced together
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Analysis {
    pub key_findings: String,
    pub research_gaps: String,
    pub clinical_recommendations: String,
}

/// Runs the summary, question answering and synthesis prompts against a chat model
#[derive(Clone, Debug)]
pub struct Analyst {
    chat: ChatClient,
}

impl Analyst {
    pub fn new(chat: ChatClient) -> Self {
        Self { chat }
    }

    pub async fn try_summarize(&self, abstract_text: &str) -> Result<String> {
        self.chat
            .complete(SUMMARIZER_SYSTEM_PROMPT, &build_summary_prompt(abstract_text))
            .await
    }

    /// Answer a question from the given articles
    ///
    /// # Errors
    ///
    /// * `AssistantError::InvalidInput` - If the question is blank
    /// * `AssistantError::NoArticles` - If `articles` is empty
    pub async fn try_answer(&self, question: &str, articles: &[ArticleRecord]) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::InvalidInput {
                message: "question must not be empty".to_string(),
            });
        }
        ensure_articles(articles)?;

        self.chat
            .complete(
                RESEARCH_ASSISTANT_SYSTEM_PROMPT,
                &build_question_prompt(question, articles),
            )
            .await
    }

    pub async fn try_key_findings(&self, articles: &[ArticleRecord]) -> Result<String> {
        ensure_articles(articles)?;
        self.chat
            .complete(ANALYST_SYSTEM_PROMPT, &build_key_findings_prompt(articles))
            .await
    }

    pub async fn try_research_gaps(&self, articles: &[ArticleRecord]) -> Result<String> {
        ensure_articles(articles)?;
        self.chat
            .complete(STRATEGIST_SYSTEM_PROMPT, &build_research_gaps_prompt(articles))
            .await
    }

    pub async fn try_clinical_recommendations(&self, articles: &[ArticleRecord]) -> Result<String> {
        ensure_articles(articles)?;
        self.chat
            .complete(
                CONSULTANT_SYSTEM_PROMPT,
                &build_clinical_recommendations_prompt(articles),
            )
            .await
    }

    pub async fn summarize(&self, abstract_text: &str) -> String {
        self.try_summarize(abstract_text)
            .await
            .unwrap_or_else(|e| degrade("summary", &e, SUMMARY_FAILED))
    }

    pub async fn answer(&self, question: &str, articles: &[ArticleRecord]) -> String {
        self.try_answer(question, articles)
            .await
            .unwrap_or_else(|e| degrade("question answering", &e, QUESTION_FAILED))
    }

    pub async fn key_findings(&self, articles: &[ArticleRecord]) -> String {
        self.try_key_findings(articles)
            .await
            .unwrap_or_else(|e| degrade("key findings", &e, ANALYSIS_FAILED))
    }

    pub async fn research_gaps(&self, articles: &[ArticleRecord]) -> String {
        self.try_research_gaps(articles)
            .await
            .unwrap_or_else(|e| degrade("research gaps", &e, ANALYSIS_FAILED))
    }

    pub async fn clinical_recommendations(&self, articles: &[ArticleRecord]) -> String {
        self.try_clinical_recommendations(articles)
            .await
            .unwrap_or_else(|e| degrade("clinical recommendations", &e, ANALYSIS_FAILED))
    }

    /// Key findings, research gaps and clinical recommendations, one call each in that order
    pub async fn analyze(&self, articles: &[ArticleRecord]) -> Analysis {
        let key_findings = self.key_findings(articles).await;
        let research_gaps = self.research_gaps(articles).await;
        let clinical_recommendations = self.clinical_recommendations(articles).await;

        info!(articles = articles.len(), "Cross-article analysis finished");
        Analysis {
            key_findings,
            research_gaps,
            clinical_recommendations,
        }
    }
}

fn ensure_articles(articles: &[ArticleRecord]) -> Result<()> {
    if articles.is_empty() {
        Err(AssistantError::NoArticles)
    } else {
        Ok(())
    }
}

pub(crate) fn degrade(operation: &str, error: &AssistantError, fallback: &str) -> String {
    warn!(operation, error = %error, "Chat completion failed, using fallback text");
    fallback.to_string()
}
