//! LLM summarizer tests against a mocked OpenAI-compatible endpoint

use history_compactor::{
    CompactionEngine, CompactionPolicy, FallbackSummarizer, HeuristicEstimator, LlmSummarizer,
    Role, Summarizer, SummarizerConfig, Turn, SUMMARY_HEADER,
};
use std::sync::Arc;
use std::time::Duration;

fn summarizer_config(endpoint: String) -> SummarizerConfig {
    SummarizerConfig {
        endpoint,
        api_key: Some("test-key".to_string()),
        model: "gpt-3.5-turbo".to_string(),
        timeout: Duration::from_secs(2),
        max_retries: 1,
    }
}

fn sample_turns() -> Vec<Turn> {
    vec![
        Turn::new(Role::User, "What is the capital of France?", 8),
        Turn::new(Role::Assistant, "The capital of France is Paris.", 8),
    ]
}

fn completion_body(content: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": content } }]
    })
    .to_string()
}

#[tokio::test]
async fn llm_summarizer_returns_model_output() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer test-key")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("User asked about France; answered Paris."))
        .create_async()
        .await;

    let summarizer =
        LlmSummarizer::new(summarizer_config(format!("{}/v1/chat/completions", server.url())))
            .unwrap();
    let summary = summarizer.summarize(&sample_turns(), 50).await.unwrap();

    assert_eq!(summary, "User asked about France; answered Paris.");
    mock.assert_async().await;
}

#[tokio::test]
async fn llm_summarizer_surfaces_api_errors() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let summarizer =
        LlmSummarizer::new(summarizer_config(format!("{}/v1/chat/completions", server.url())))
            .unwrap();
    assert!(summarizer.summarize(&sample_turns(), 50).await.is_err());
}

#[tokio::test]
async fn fallback_degrades_to_rule_based_on_http_failure() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .create_async()
        .await;

    let external =
        LlmSummarizer::new(summarizer_config(format!("{}/v1/chat/completions", server.url())))
            .unwrap();
    let fallback = FallbackSummarizer::new(Some(Arc::new(external)), Duration::from_secs(2));

    let summary = fallback.summarize(&sample_turns(), 50).await.unwrap();
    assert!(summary.starts_with(SUMMARY_HEADER));
    assert!(summary.contains("What is the capital of France"));
}

#[tokio::test]
async fn engine_compacts_with_mocked_llm_summary() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(completion_body("Earlier: small talk about geography."))
        .create_async()
        .await;

    let external =
        LlmSummarizer::new(summarizer_config(format!("{}/v1/chat/completions", server.url())))
            .unwrap();
    let engine = CompactionEngine::new(
        CompactionPolicy {
            max_token_limit: 40,
            recent_message_count: 1,
            summarization_ratio: 0.3,
        },
        Arc::new(HeuristicEstimator),
        Some(Arc::new(external)),
        Duration::from_secs(2),
    )
    .unwrap();

    for i in 0..3 {
        engine
            .add_user_message(format!("Mocked question number {} padded for size.", i))
            .await;
        engine
            .add_assistant_message(format!("Mocked answer number {} padded for it.", i))
            .await;
    }

    let snapshot = engine.snapshot().await;
    assert!(snapshot[0].is_summary());
    assert_eq!(snapshot[0].content, "Earlier: small talk about geography.");

    let sum: usize = snapshot.iter().map(|t| t.token_count).sum();
    assert_eq!(engine.estimated_tokens().await, sum);
}

#[tokio::test]
async fn engine_compaction_survives_unreachable_summarizer() {
    // Nothing listens on this port; reqwest fails fast and the engine must
    // still compact via the rule-based fallback.
    let external = LlmSummarizer::new(SummarizerConfig {
        endpoint: "http://127.0.0.1:1/v1/chat/completions".to_string(),
        api_key: None,
        model: "gpt-3.5-turbo".to_string(),
        timeout: Duration::from_millis(200),
        max_retries: 1,
    })
    .unwrap();

    let engine = CompactionEngine::new(
        CompactionPolicy {
            max_token_limit: 40,
            recent_message_count: 1,
            summarization_ratio: 0.3,
        },
        Arc::new(HeuristicEstimator),
        Some(Arc::new(external)),
        Duration::from_secs(1),
    )
    .unwrap();

    for i in 0..3 {
        engine
            .add_user_message(format!("Offline question number {} padded for size.", i))
            .await;
        engine
            .add_assistant_message(format!("Offline answer number {} padded for it.", i))
            .await;
    }

    let snapshot = engine.snapshot().await;
    assert!(snapshot[0].is_summary());
    assert!(snapshot[0].content.starts_with(SUMMARY_HEADER));
}
