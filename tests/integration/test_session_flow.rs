//! End-to-end command handling: search, summarize, analyze, ask and rerun over
//! mocked PubMed and chat-completion servers

mod common;

use common::{
    EFETCH_TWO_ARTICLES, REQUESTED_PMIDS, chat_body, create_mock_assistant, mount_efetch,
    mount_esearch,
};
use pubmed_assistant::analysis::{ANALYSIS_FAILED, SUMMARY_FAILED};
use pubmed_assistant::demo::DEMONSTRATION_ARTICLE_COUNT;
use pubmed_assistant::{AssistantError, SearchFilters, SearchRequest, SessionState};
use tracing_test::traced_test;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn coronavirus_request() -> SearchRequest {
    SearchRequest::new(SearchFilters::new().keyword_list("coronavirus")).max_results(5)
}

/// PubMed server answering with the two-article fixture
async fn pubmed_with_articles() -> MockServer {
    let server = MockServer::start().await;
    mount_esearch(&server, "1234", &REQUESTED_PMIDS).await;
    mount_efetch(&server, EFETCH_TWO_ARTICLES).await;
    server
}

async fn mount_chat(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .mount(server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_search_populates_state_and_history() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, report) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    let report = report.unwrap();

    assert_eq!(report.query, r#"("coronavirus")"#);
    assert_eq!(report.result_count, 1234);
    assert_eq!(report.articles_returned, 2);
    assert!(!report.demonstration);
    assert!(report.notices.is_empty());

    assert_eq!(state.last_query, report.query);
    assert_eq!(state.result_count, 1234);
    assert_eq!(state.articles.len(), 2);
    assert_eq!(state.search_history.len(), 1);

    let metrics = state.metrics();
    assert_eq!(metrics.total_results, 1234);
    assert_eq!(metrics.most_recent_year, Some(2021));
    assert!((metrics.average_authors - 2.0).abs() < f64::EPSILON);

    // No completion is requested by a search
    assert!(llm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_empty_filters_rejected_without_requests() {
    let pubmed = MockServer::start().await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, report) = assistant
        .search(SessionState::new(), SearchRequest::new(SearchFilters::new()))
        .await;

    assert!(matches!(report, Err(AssistantError::EmptyQuery)));
    assert!(state.search_history.is_empty());
    assert!(pubmed.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_out_of_range_max_results_rejected() {
    let pubmed = MockServer::start().await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let request = coronavirus_request().max_results(21);
    let (_, report) = assistant.search(SessionState::new(), request).await;

    assert!(matches!(report, Err(AssistantError::InvalidInput { .. })));
    assert!(pubmed.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_summary_is_memoized_per_pmid() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Cluster of pneumonia.")))
        .expect(1)
        .mount(&llm)
        .await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;

    let (state, first) = assistant.summarize(state, "31978945").await;
    let first = first.unwrap();
    assert_eq!(first.summary, "Cluster of pneumonia.");
    assert!(!first.cached);

    let (state, second) = assistant.summarize(state, "31978945").await;
    let second = second.unwrap();
    assert_eq!(second.summary, "Cluster of pneumonia.");
    assert!(second.cached);
    assert_eq!(state.summaries.len(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_failed_summary_is_retried() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&llm)
        .await;
    mount_chat(&llm, "Recovered summary.").await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;

    let (state, failed) = assistant.summarize(state, "33515491").await;
    assert_eq!(failed.unwrap().summary, SUMMARY_FAILED);
    assert!(state.summaries.is_empty());

    let (state, retried) = assistant.summarize(state, "33515491").await;
    let retried = retried.unwrap();
    assert_eq!(retried.summary, "Recovered summary.");
    assert!(!retried.cached);
    assert_eq!(state.summaries.get("33515491").unwrap(), "Recovered summary.");
}

#[tokio::test]
#[traced_test]
async fn test_summarize_unknown_pmid() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    let (state, result) = assistant.summarize(state, "999").await;

    assert!(matches!(
        result,
        Err(AssistantError::ArticleNotFound { ref pmid }) if pmid == "999"
    ));
    assert_eq!(state.articles.len(), 2);
    assert!(llm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_summarize_all_in_result_order() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    mount_chat(&llm, "Summary.").await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    let (state, outputs) = assistant.summarize_all(state).await;

    let pmids: Vec<&str> = outputs.iter().map(|o| o.pmid.as_str()).collect();
    assert_eq!(pmids, REQUESTED_PMIDS);
    assert_eq!(state.summaries.len(), 2);
}

#[tokio::test]
#[traced_test]
async fn test_analysis_is_stored_until_next_search() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    mount_chat(&llm, "- point").await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;

    let (state, first) = assistant.analyze(state).await;
    let first = first.unwrap();
    assert!(!first.cached);
    assert_eq!(first.analysis.key_findings, "- point");
    assert_eq!(llm.received_requests().await.unwrap().len(), 3);

    let (state, second) = assistant.analyze(state).await;
    assert!(second.unwrap().cached);
    assert_eq!(llm.received_requests().await.unwrap().len(), 3);

    // A new search clears derived results
    let (state, _) = assistant.search(state, coronavirus_request()).await;
    assert!(state.analysis.is_none());
    assert!(state.summaries.is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_fully_failed_analysis_not_stored() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&llm)
        .await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    let (state, output) = assistant.analyze(state).await;

    let output = output.unwrap();
    assert_eq!(output.analysis.key_findings, ANALYSIS_FAILED);
    assert_eq!(output.analysis.research_gaps, ANALYSIS_FAILED);
    assert_eq!(output.analysis.clinical_recommendations, ANALYSIS_FAILED);
    assert!(state.analysis.is_none());
}

#[tokio::test]
#[traced_test]
async fn test_analyze_and_ask_require_articles() {
    let pubmed = MockServer::start().await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, analysis) = assistant.analyze(SessionState::new()).await;
    assert!(matches!(analysis, Err(AssistantError::NoArticles)));

    let (state, answer) = assistant.ask(state, "Is it safe?").await;
    assert!(matches!(answer, Err(AssistantError::NoArticles)));
    assert!(state.pending_question.is_none());
    assert!(llm.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
#[traced_test]
async fn test_ask_answers_from_current_articles() {
    let pubmed = pubmed_with_articles().await;
    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Question: What caused the outbreak?"))
        .and(body_string_contains("A pneumonia outbreak associated with a new coronavirus"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("A new coronavirus.")))
        .expect(1)
        .mount(&llm)
        .await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, _) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;

    let (state, blank) = assistant.ask(state, "   ").await;
    assert!(matches!(blank, Err(AssistantError::InvalidInput { .. })));

    let (state, answer) = assistant.ask(state, "What caused the outbreak?").await;
    assert_eq!(answer.unwrap(), "A new coronavirus.");
    assert_eq!(
        state.pending_question.as_deref(),
        Some("What caused the outbreak?")
    );
}

#[tokio::test]
#[traced_test]
async fn test_failed_search_shows_demonstration_articles() {
    let pubmed = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&pubmed)
        .await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, report) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    let report = report.unwrap();

    assert!(report.demonstration);
    assert_eq!(report.result_count, 0);
    assert_eq!(report.articles_returned, DEMONSTRATION_ARTICLE_COUNT);
    // Count failure, fetch failure, demonstration warning
    assert_eq!(report.notices.len(), 3);
    assert!(state.demonstration);
    assert_eq!(state.search_history.len(), 1);
}

#[tokio::test]
#[traced_test]
async fn test_rerun_skips_demonstration_data_and_keeps_history() {
    let pubmed = MockServer::start().await;
    mount_esearch(&pubmed, "0", &[]).await;
    let llm = MockServer::start().await;
    let assistant = create_mock_assistant(&pubmed, &llm);

    let (state, first) = assistant
        .search(SessionState::new(), coronavirus_request())
        .await;
    assert!(first.unwrap().demonstration);

    let asthma = SearchRequest::new(SearchFilters::new().disease("asthma"));
    let (state, _) = assistant.search(state, asthma).await;
    let history_before: Vec<String> = state.search_history.iter().cloned().collect();
    assert_eq!(history_before.len(), 2);

    let (state, rerun) = assistant.rerun(state, 0, 5).await;
    let rerun = rerun.unwrap();

    assert_eq!(rerun.query, r#"("coronavirus")"#);
    assert!(!rerun.demonstration);
    assert!(state.articles.is_empty());
    assert_eq!(state.last_query, r#"("coronavirus")"#);
    let history_after: Vec<String> = state.search_history.iter().cloned().collect();
    assert_eq!(history_after, history_before);

    let (_, missing) = assistant.rerun(state, 7, 5).await;
    assert!(matches!(missing, Err(AssistantError::InvalidInput { .. })));
}
