//! Per-session state and the command handlers that advance it
//!
//! Handlers take the current [`SessionState`] by value and hand back the next
//! state together with the outcome of the command. A rejected command returns
//! the state it was given, unchanged.

use crate::analysis::{ANALYSIS_FAILED, Analysis, Analyst, QUESTION_FAILED, SUMMARY_FAILED, degrade};
use crate::error::{AssistantError, Result};
use crate::export::{ExportContext, ExportFormat};
use crate::notice::Notice;
use crate::pubmed::models::ArticleRecord;
use crate::pubmed::{PubMedClient, SearchFilters};
use chrono::{Local, NaiveDate};
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;
use tracing::{debug, info, instrument};

/// Distinct queries kept in the search history
pub const SEARCH_HISTORY_LIMIT: usize = 10;

pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Upper bound accepted for `max_results`
pub const MAX_RESULTS_LIMIT: usize = 20;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub last_query: String,
    pub result_count: u64,
    pub articles: Vec<ArticleRecord>,
    /// True when `articles` holds the demonstration set
    pub demonstration: bool,
    /// Summary text keyed by PMID
    pub summaries: HashMap<String, String>,
    pub analysis: Option<Analysis>,
    /// Oldest first
    pub search_history: VecDeque<String>,
    pub pending_question: Option<String>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_results(&self) -> bool {
        !self.articles.is_empty()
    }

    pub fn article(&self, pmid: &str) -> Option<&ArticleRecord> {
        self.articles.iter().find(|a| a.pmid == pmid)
    }

    /// Append a query unless already present, dropping the oldest past the limit
    pub fn record_query(&mut self, query: &str) {
        if self.search_history.iter().any(|q| q == query) {
            return;
        }
        self.search_history.push_back(query.to_string());
        while self.search_history.len() > SEARCH_HISTORY_LIMIT {
            self.search_history.pop_front();
        }
    }

    /// The most recent `n` history entries, oldest first
    pub fn recent_queries(&self, n: usize) -> impl Iterator<Item = &String> {
        let skip = self.search_history.len().saturating_sub(n);
        self.search_history.iter().skip(skip)
    }

    pub fn metrics(&self) -> ResultMetrics {
        ResultMetrics::compute(self.result_count, &self.articles)
    }

    pub fn export_context(&self, generated_on: NaiveDate) -> ExportContext<'_> {
        ExportContext {
            query: &self.last_query,
            result_count: self.result_count,
            articles: &self.articles,
            summaries: &self.summaries,
            analysis: self.analysis.as_ref(),
            generated_on,
        }
    }

    /// Render the current results in `format`, dated today
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        self.export_context(Local::now().date_naive()).render(format)
    }

    fn replace_results(&mut self, query: String, result_count: u64, fetched: FetchedArticles) {
        self.last_query = query;
        self.result_count = result_count;
        self.articles = fetched.articles;
        self.demonstration = fetched.demonstration;
        self.summaries.clear();
        self.analysis = None;
        self.pending_question = None;
    }
}

struct FetchedArticles {
    articles: Vec<ArticleRecord>,
    demonstration: bool,
}

/// Summary figures for the current result set
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultMetrics {
    pub total_results: u64,
    /// Latest year over all articles, taking the last four-digit group of each date
    pub most_recent_year: Option<i32>,
    /// Mean author count rounded to one decimal; `0.0` with no articles
    pub average_authors: f64,
}

impl ResultMetrics {
    pub fn compute(total_results: u64, articles: &[ArticleRecord]) -> Self {
        static FOUR_DIGITS: OnceLock<Regex> = OnceLock::new();
        let re = FOUR_DIGITS.get_or_init(|| Regex::new(r"\d{4}").expect("four digit pattern is valid"));

        let most_recent_year = articles
            .iter()
            .filter_map(|a| re.find_iter(&a.publication_date).last())
            .filter_map(|m| m.as_str().parse::<i32>().ok())
            .max();

        let average_authors = if articles.is_empty() {
            0.0
        } else {
            let total: usize = articles.iter().map(|a| a.authors.len()).sum();
            (total as f64 / articles.len() as f64 * 10.0).round() / 10.0
        };

        Self {
            total_results,
            most_recent_year,
            average_authors,
        }
    }
}

/// Filters and result limit for one search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub filters: SearchFilters,
    pub max_results: usize,
    /// Substitute demonstration articles when nothing is found
    pub use_demo_data: bool,
}

impl SearchRequest {
    pub fn new(filters: SearchFilters) -> Self {
        Self {
            filters,
            max_results: DEFAULT_MAX_RESULTS,
            use_demo_data: true,
        }
    }

    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn use_demo_data(mut self, enabled: bool) -> Self {
        self.use_demo_data = enabled;
        self
    }
}

/// What a search or rerun produced
#[derive(Debug, Clone, PartialEq)]
pub struct SearchReport {
    pub query: String,
    pub result_count: u64,
    pub articles_returned: usize,
    pub demonstration: bool,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutput {
    pub pmid: String,
    pub summary: String,
    /// Served from the session cache without a model call
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutput {
    pub analysis: Analysis,
    pub cached: bool,
}

/// Command handlers over a PubMed client and an analyst
#[derive(Clone, Debug)]
pub struct ResearchAssistant {
    pubmed: PubMedClient,
    analyst: Analyst,
}

impl ResearchAssistant {
    pub fn new(pubmed: PubMedClient, analyst: Analyst) -> Self {
        Self { pubmed, analyst }
    }

    pub fn pubmed(&self) -> &PubMedClient {
        &self.pubmed
    }

    pub fn analyst(&self) -> &Analyst {
        &self.analyst
    }

    /// Build the query, fetch count and articles, and reset derived state
    ///
    /// # Errors
    ///
    /// * `AssistantError::EmptyQuery` - If the filters produce no clause
    /// * `AssistantError::InvalidInput` - If `max_results` is outside `1..=20`
    ///
    /// Network failures never surface here; they degrade to notices.
    #[instrument(skip_all, fields(max_results = request.max_results))]
    pub async fn search(
        &self,
        mut state: SessionState,
        request: SearchRequest,
    ) -> (SessionState, Result<SearchReport>) {
        if let Err(e) = validate_max_results(request.max_results) {
            return (state, Err(e));
        }

        let query = request.filters.build();
        if query.is_empty() {
            return (state, Err(AssistantError::EmptyQuery));
        }

        let report = self
            .run_query(&mut state, query, request.max_results, request.use_demo_data)
            .await;
        state.record_query(&report.query);

        info!(
            query = %report.query,
            result_count = report.result_count,
            returned = report.articles_returned,
            "Search finished"
        );
        (state, Ok(report))
    }

    /// Re-issue a query from the history, oldest first, without demonstration data
    ///
    /// The history itself is left as it was.
    #[instrument(skip(self, state))]
    pub async fn rerun(
        &self,
        mut state: SessionState,
        history_index: usize,
        max_results: usize,
    ) -> (SessionState, Result<SearchReport>) {
        if let Err(e) = validate_max_results(max_results) {
            return (state, Err(e));
        }

        let Some(query) = state.search_history.get(history_index).cloned() else {
            let message = format!(
                "no search history entry {history_index}; history holds {} queries",
                state.search_history.len()
            );
            return (state, Err(AssistantError::InvalidInput { message }));
        };

        let report = self.run_query(&mut state, query, max_results, false).await;
        (state, Ok(report))
    }

    async fn run_query(
        &self,
        state: &mut SessionState,
        query: String,
        max_results: usize,
        use_demo_data: bool,
    ) -> SearchReport {
        let count = self.pubmed.result_count(&query).await;
        let fetched = self
            .pubmed
            .search_and_fetch(&query, max_results, use_demo_data)
            .await;

        let mut notices = count.notices;
        notices.extend(fetched.notices);

        let report = SearchReport {
            query: query.clone(),
            result_count: count.count,
            articles_returned: fetched.articles.len(),
            demonstration: fetched.demonstration,
            notices,
        };

        state.replace_results(
            query,
            count.count,
            FetchedArticles {
                articles: fetched.articles,
                demonstration: fetched.demonstration,
            },
        );
        report
    }

    /// Summary for one article, memoized per PMID
    ///
    /// A failed completion yields the fixed failure text and is not cached, so
    /// asking again retries.
    #[instrument(skip(self, state))]
    pub async fn summarize(
        &self,
        mut state: SessionState,
        pmid: &str,
    ) -> (SessionState, Result<SummaryOutput>) {
        if let Some(summary) = state.summaries.get(pmid) {
            debug!("Summary served from cache");
            let output = SummaryOutput {
                pmid: pmid.to_string(),
                summary: summary.clone(),
                cached: true,
            };
            return (state, Ok(output));
        }

        let Some(article) = state.article(pmid) else {
            let error = AssistantError::ArticleNotFound {
                pmid: pmid.to_string(),
            };
            return (state, Err(error));
        };

        let summary = match self.analyst.try_summarize(&article.abstract_text).await {
            Ok(summary) => {
                state.summaries.insert(pmid.to_string(), summary.clone());
                summary
            }
            Err(e) => degrade("summary", &e, SUMMARY_FAILED),
        };

        let output = SummaryOutput {
            pmid: pmid.to_string(),
            summary,
            cached: false,
        };
        (state, Ok(output))
    }

    /// Summaries for every current article, one at a time in result order
    pub async fn summarize_all(&self, mut state: SessionState) -> (SessionState, Vec<SummaryOutput>) {
        let pmids: Vec<String> = state.articles.iter().map(|a| a.pmid.clone()).collect();
        let mut outputs = Vec::with_capacity(pmids.len());

        for pmid in pmids {
            let (next, output) = self.summarize(state, &pmid).await;
            state = next;
            if let Ok(output) = output {
                outputs.push(output);
            }
        }
        (state, outputs)
    }

    /// Key findings, research gaps and clinical recommendations over the current articles
    ///
    /// Computed once per result set; later calls return the stored analysis.
    #[instrument(skip_all, fields(articles = state.articles.len()))]
    pub async fn analyze(&self, mut state: SessionState) -> (SessionState, Result<AnalysisOutput>) {
        if let Some(analysis) = &state.analysis {
            let output = AnalysisOutput {
                analysis: analysis.clone(),
                cached: true,
            };
            return (state, Ok(output));
        }
        if !state.has_results() {
            return (state, Err(AssistantError::NoArticles));
        }

        let analysis = self.analyst.analyze(&state.articles).await;
        let all_failed = [
            &analysis.key_findings,
            &analysis.research_gaps,
            &analysis.clinical_recommendations,
        ]
        .iter()
        .all(|text| text.as_str() == ANALYSIS_FAILED);

        // A fully failed analysis is not kept, so the next call retries
        if !all_failed {
            state.analysis = Some(analysis.clone());
        }

        let output = AnalysisOutput {
            analysis,
            cached: false,
        };
        (state, Ok(output))
    }

    /// Answer a question from the current articles
    ///
    /// # Errors
    ///
    /// * `AssistantError::InvalidInput` - If the question is blank
    /// * `AssistantError::NoArticles` - If no search has produced articles
    #[instrument(skip(self, state))]
    pub async fn ask(&self, mut state: SessionState, question: &str) -> (SessionState, Result<String>) {
        let question = question.trim();
        if question.is_empty() {
            let error = AssistantError::InvalidInput {
                message: "Please enter a question".to_string(),
            };
            return (state, Err(error));
        }
        if !state.has_results() {
            return (state, Err(AssistantError::NoArticles));
        }

        state.pending_question = Some(question.to_string());
        let answer = match self.analyst.try_answer(question, &state.articles).await {
            Ok(answer) => answer,
            Err(e) => degrade("question answering", &e, QUESTION_FAILED),
        };
        (state, Ok(answer))
    }
}

fn validate_max_results(max_results: usize) -> Result<()> {
    if (1..=MAX_RESULTS_LIMIT).contains(&max_results) {
        Ok(())
    } else {
        Err(AssistantError::InvalidInput {
            message: format!("max results must be between 1 and {MAX_RESULTS_LIMIT}, got {max_results}"),
        })
    }
}
