//! ESearch and EFetch behavior against a mocked E-utilities server
//!
//! Covers the count and ID requests, record normalization and pairing, and the
//! demonstration-data fallback taken when a search is empty or fails.

mod common;

use common::{
    EFETCH_TWO_ARTICLES, REQUESTED_PMIDS, create_mock_client, esearch_body, mount_efetch,
    mount_esearch,
};
use pubmed_assistant::demo::DEMONSTRATION_ARTICLE_COUNT;
use pubmed_assistant::{AssistantError, ClientConfig, NoticeLevel, PubMedClient};
use tracing_test::traced_test;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_server_error(server: &MockServer) {
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_fetch_count_parses_string_count() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("db", "pubmed"))
        .and(query_param("term", r#"("asthma")"#))
        .and(query_param("retmode", "json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(esearch_body("42", &["1", "2"])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let count = client.fetch_count(r#"("asthma")"#).await.unwrap();

    assert_eq!(count, 42);
}

#[tokio::test]
#[traced_test]
async fn test_fetch_count_rejects_non_numeric_count() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "many", &[]).await;

    let client = create_mock_client(&mock_server);
    let err = client.fetch_count("asthma").await.unwrap_err();

    assert!(
        matches!(err, AssistantError::InvalidCount { ref value } if value == "many"),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
#[traced_test]
async fn test_result_count_degrades_to_zero_with_error_notice() {
    let mock_server = MockServer::start().await;
    mount_server_error(&mock_server).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.result_count("asthma").await;

    assert_eq!(outcome.count, 0);
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Error);
    assert!(outcome.notices[0].message.starts_with("Error fetching result count"));

    // The strict variant surfaces the same failure
    assert!(matches!(
        client.fetch_count("asthma").await,
        Err(AssistantError::ApiError { .. })
    ));
}

#[tokio::test]
#[traced_test]
async fn test_search_ids_sends_retmax_and_credentials() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/esearch.fcgi"))
        .and(query_param("retmax", "3"))
        .and(query_param("api_key", "test-key"))
        .and(query_param("email", "me@example.org"))
        .and(query_param("tool", "pubmed-assistant"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(esearch_body("120", &["3", "2", "1"])),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = ClientConfig::new()
        .with_base_url(mock_server.uri())
        .with_api_key("test-key")
        .with_email("me@example.org");
    let client = PubMedClient::with_config(config).unwrap();

    let ids = client.search_ids("sepsis", 3).await.unwrap();
    assert_eq!(ids, vec!["3", "2", "1"]);
}

#[tokio::test]
#[traced_test]
async fn test_fetch_records_follow_requested_order() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/efetch.fcgi"))
        .and(query_param("id", "31978945,33515491"))
        .and(query_param("retmode", "xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(EFETCH_TWO_ARTICLES)
                .insert_header("content-type", "application/xml"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_mock_client(&mock_server);
    let pmids: Vec<String> = REQUESTED_PMIDS.iter().map(|s| s.to_string()).collect();
    let records = client.fetch_records(&pmids).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].pmid, "31978945");
    assert_eq!(records[1].pmid, "33515491");

    let coronavirus = &records[0];
    assert_eq!(
        coronavirus.title,
        "A pneumonia outbreak associated with a new coronavirus"
    );
    assert_eq!(coronavirus.publication_date, "Mar 12, 2020");
    assert_eq!(coronavirus.journal, "Nature");
    assert_eq!(coronavirus.keywords, vec!["coronavirus", "pneumonia"]);

    let melanoma = &records[1];
    assert_eq!(melanoma.title, "Checkpoint inhibitors in advanced melanoma");
    assert_eq!(
        melanoma.abstract_text,
        "Background: Immunotherapy changed care. Methods: We pooled 12 trials. "
    );
    assert_eq!(
        melanoma.authors,
        vec!["John Smith", "ML Garcia", "Melanoma Study Group"]
    );
    assert_eq!(melanoma.publication_date, "Feb 2021");
    assert_eq!(melanoma.keywords, vec!["Melanoma"]);
    assert_eq!(
        melanoma.article_url,
        "https://pubmed.ncbi.nlm.nih.gov/33515491/"
    );
}

#[tokio::test]
#[traced_test]
async fn test_search_and_fetch_returns_real_records() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "2", &REQUESTED_PMIDS).await;
    mount_efetch(&mock_server, EFETCH_TWO_ARTICLES).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("coronavirus", 5, true).await;

    assert!(!outcome.demonstration);
    assert!(outcome.notices.is_empty());
    assert_eq!(outcome.articles.len(), 2);
    assert_eq!(outcome.articles[0].pmid, "31978945");
}

#[tokio::test]
#[traced_test]
async fn test_empty_search_falls_back_to_demonstration_data() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "0", &[]).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("nothing matches", 5, true).await;

    assert!(outcome.demonstration);
    assert_eq!(outcome.articles.len(), DEMONSTRATION_ARTICLE_COUNT);
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);

    // No EFetch call for an empty ID list
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].url.path(), "/esearch.fcgi");
}

#[tokio::test]
#[traced_test]
async fn test_empty_search_without_demonstration_data() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "0", &[]).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("nothing matches", 5, false).await;

    assert!(!outcome.demonstration);
    assert!(outcome.articles.is_empty());
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Info);
}

#[tokio::test]
#[traced_test]
async fn test_server_error_yields_demonstration_data_with_notices() {
    let mock_server = MockServer::start().await;
    mount_server_error(&mock_server).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("asthma", 5, true).await;

    assert!(outcome.demonstration);
    assert_eq!(outcome.articles.len(), DEMONSTRATION_ARTICLE_COUNT);
    let levels: Vec<NoticeLevel> = outcome.notices.iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Error, NoticeLevel::Warning]);
    assert!(logs_contain("PubMed fetch failed"));
}

#[tokio::test]
#[traced_test]
async fn test_server_error_without_demonstration_data_is_empty() {
    let mock_server = MockServer::start().await;
    mount_server_error(&mock_server).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("asthma", 5, false).await;

    assert!(!outcome.demonstration);
    assert!(outcome.articles.is_empty());
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
#[traced_test]
async fn test_malformed_efetch_is_treated_as_failure() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "1", &["31978945"]).await;
    mount_efetch(&mock_server, "<PubmedArticleSet><PubmedArticle>").await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("coronavirus", 5, false).await;

    assert!(outcome.articles.is_empty());
    assert_eq!(outcome.notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
#[traced_test]
async fn test_unmatched_efetch_records_fall_back_with_notice() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "2", &["111", "222"]).await;
    mount_efetch(&mock_server, EFETCH_TWO_ARTICLES).await;

    let client = create_mock_client(&mock_server);

    let outcome = client.search_and_fetch("coronavirus", 5, true).await;
    assert!(outcome.demonstration);
    assert_eq!(outcome.articles.len(), DEMONSTRATION_ARTICLE_COUNT);
    assert_eq!(outcome.notices.len(), 2);
    assert_eq!(outcome.notices[0].level, NoticeLevel::Warning);
    assert_eq!(
        outcome.notices[0].message,
        "2 of 2 articles could not be retrieved from PubMed."
    );

    let outcome = client.search_and_fetch("coronavirus", 5, false).await;
    assert!(!outcome.demonstration);
    assert!(outcome.articles.is_empty());
    let levels: Vec<NoticeLevel> = outcome.notices.iter().map(|n| n.level).collect();
    assert_eq!(levels, vec![NoticeLevel::Warning, NoticeLevel::Info]);
}

#[tokio::test]
#[traced_test]
async fn test_partially_returned_records_keep_survivors() {
    let mock_server = MockServer::start().await;
    mount_esearch(&mock_server, "2", &["31978945", "999"]).await;
    mount_efetch(&mock_server, EFETCH_TWO_ARTICLES).await;

    let client = create_mock_client(&mock_server);
    let outcome = client.search_and_fetch("coronavirus", 5, true).await;

    assert!(!outcome.demonstration);
    assert_eq!(outcome.articles.len(), 1);
    assert_eq!(outcome.articles[0].pmid, "31978945");
    assert_eq!(outcome.notices.len(), 1);
    assert_eq!(
        outcome.notices[0].message,
        "1 of 2 articles could not be retrieved from PubMed."
    );
    assert!(logs_contain("EFetch did not return every requested record"));
}
