//! Summaries, question answering and cross-article synthesis against a mocked
//! chat-completion endpoint

mod common;

use common::{TEST_API_KEY, chat_body, create_mock_chat, sample_article};
use pubmed_assistant::analysis::{ANALYSIS_FAILED, QUESTION_FAILED, SUMMARY_FAILED};
use pubmed_assistant::{Analyst, AssistantError};
use serde_json::json;
use tracing_test::traced_test;
use wiremock::matchers::{bearer_token, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .mount(server)
        .await;
}

/// Reply with `content` only when the request body mentions `persona`
async fn mount_persona_reply(server: &MockServer, persona: &str, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(persona))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body(content)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
#[traced_test]
async fn test_complete_sends_model_messages_and_bearer_token() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(bearer_token(TEST_API_KEY))
        .and(body_partial_json(json!({
            "model": "gpt-3.5-turbo",
            "messages": [
                {"role": "system", "content": "persona"},
                {"role": "user", "content": "prompt"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("  reply text \n")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let chat = create_mock_chat(&mock_server);
    let reply = chat.complete("persona", "prompt").await.unwrap();

    assert_eq!(reply, "reply text");
}

#[tokio::test]
#[traced_test]
async fn test_summary_uses_summary_prompt() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("medical research summarizer"))
        .and(body_string_contains(
            "Summarize the following medical abstract in about 2-3 sentences (maximum 300 characters):",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Short summary.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));
    let summary = analyst.summarize("Long abstract text.").await;

    assert_eq!(summary, "Short summary.");
}

#[tokio::test]
#[traced_test]
async fn test_server_error_degrades_to_fixed_text() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&mock_server)
        .await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));

    let err = analyst.try_summarize("Abstract.").await.unwrap_err();
    match err {
        AssistantError::ApiError { message } => {
            assert!(message.contains("500"));
            assert!(message.contains("upstream exploded"));
        }
        other => panic!("unexpected error: {other:?}"),
    }

    assert_eq!(analyst.summarize("Abstract.").await, SUMMARY_FAILED);
    let articles = vec![sample_article("1", "Trial")];
    assert_eq!(analyst.answer("Does it work?", &articles).await, QUESTION_FAILED);
    assert_eq!(analyst.key_findings(&articles).await, ANALYSIS_FAILED);
    assert!(logs_contain("Chat completion failed, using fallback text"));
}

#[tokio::test]
#[traced_test]
async fn test_blank_completion_is_an_error() {
    let mock_server = MockServer::start().await;
    mount_reply(&mock_server, "   ").await;

    let chat = create_mock_chat(&mock_server);
    assert!(matches!(
        chat.complete("persona", "prompt").await,
        Err(AssistantError::EmptyCompletion)
    ));
}

#[tokio::test]
#[traced_test]
async fn test_missing_choices_is_an_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&mock_server)
        .await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));
    assert!(matches!(
        analyst.try_summarize("Abstract.").await,
        Err(AssistantError::EmptyCompletion)
    ));
    assert_eq!(analyst.summarize("Abstract.").await, SUMMARY_FAILED);
}

#[tokio::test]
#[traced_test]
async fn test_question_prompt_carries_article_details() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("medical research assistant"))
        .and(body_string_contains("Question: Which drug works best?"))
        .and(body_string_contains("Authors: Jane Smith, Bo Kim"))
        .and(body_string_contains("Publication: BMJ, Mar 2021"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Drug A.")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));
    let articles = vec![sample_article("1", "Asthma trial")];
    let answer = analyst.answer("  Which drug works best? ", &articles).await;

    assert_eq!(answer, "Drug A.");
}

#[tokio::test]
#[traced_test]
async fn test_analyze_makes_one_call_per_persona() {
    let mock_server = MockServer::start().await;
    mount_persona_reply(&mock_server, "medical research analyst", "- finding").await;
    mount_persona_reply(&mock_server, "medical research strategist", "- gap").await;
    mount_persona_reply(&mock_server, "medical research consultant", "- recommendation").await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));
    let articles = vec![
        sample_article("1", "First trial"),
        sample_article("2", "Second trial"),
    ];
    let analysis = analyst.analyze(&articles).await;

    assert_eq!(analysis.key_findings, "- finding");
    assert_eq!(analysis.research_gaps, "- gap");
    assert_eq!(analysis.clinical_recommendations, "- recommendation");
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
#[traced_test]
async fn test_partial_analysis_failure_keeps_other_sections() {
    let mock_server = MockServer::start().await;
    mount_persona_reply(&mock_server, "medical research analyst", "- finding").await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("medical research strategist"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;
    mount_persona_reply(&mock_server, "medical research consultant", "- recommendation").await;

    let analyst = Analyst::new(create_mock_chat(&mock_server));
    let analysis = analyst.analyze(&[sample_article("1", "Trial")]).await;

    assert_eq!(analysis.key_findings, "- finding");
    assert_eq!(analysis.research_gaps, ANALYSIS_FAILED);
    assert_eq!(analysis.clinical_recommendations, "- recommendation");
}
