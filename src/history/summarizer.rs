//! Summarization strategies for compacting aged conversation turns

use super::models::{Role, Turn};
use crate::metrics::METRICS;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Fixed header emitted by the rule-based summarizer
pub const SUMMARY_HEADER: &str = "CONVERSATION HISTORY SUMMARY:";

/// Clause truncation limit for rule-based summary lines
const CLAUSE_MAX_CHARS: usize = 100;

/// Summarizer trait for different summarization strategies
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Condense a sequence of turns into a single text block
    ///
    /// `target_tokens` is advisory: implementations should aim for it but the
    /// caller re-estimates the result rather than trusting it was met.
    async fn summarize(
        &self,
        turns: &[Turn],
        target_tokens: usize,
    ) -> Result<String, SummarizerError>;
}

/// Summarizer errors
#[derive(Debug, thiserror::Error)]
pub enum SummarizerError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Summarization timed out after {0:?}")]
    Timeout(Duration),

    #[error("Unknown error")]
    Unknown,
}

/// Rule-based summarizer: no I/O, never fails
///
/// Groups the input into User/Assistant exchange pairs in order and emits one
/// numbered line pair per exchange under [`SUMMARY_HEADER`]. System turns
/// (prior summaries being re-folded) contribute no lines, and a trailing
/// unpaired User turn is dropped rather than carried forward. Both are lossy
/// by design; summaries keep no provenance link to the turns they replace.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedSummarizer;

impl RuleBasedSummarizer {
    /// Truncate content at its first sentence terminator or at
    /// [`CLAUSE_MAX_CHARS`], whichever comes first
    fn clause(text: &str) -> String {
        let mut cut = None;
        for (seen, (idx, ch)) in text.char_indices().enumerate() {
            if seen == CLAUSE_MAX_CHARS {
                cut = Some(idx);
                break;
            }
            if matches!(ch, '.' | '!' | '?') {
                cut = Some(idx);
                break;
            }
        }
        match cut {
            Some(idx) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }

    /// Pair turns into (user, assistant) exchanges, in order
    fn exchanges(turns: &[Turn]) -> Vec<(String, String)> {
        let mut exchanges = Vec::new();
        let mut user: Option<String> = None;
        let mut assistant: Option<String> = None;

        for turn in turns {
            match turn.role {
                Role::User => {
                    if assistant.is_some() {
                        if let (Some(u), Some(a)) = (user.take(), assistant.take()) {
                            exchanges.push((u, a));
                        }
                    }
                    user = Some(turn.content.clone());
                }
                Role::Assistant => assistant = Some(turn.content.clone()),
                Role::System => {}
            }
        }

        // A dangling User turn with no paired response is dropped here.
        if let (Some(u), Some(a)) = (user, assistant) {
            exchanges.push((u, a));
        }

        exchanges
    }

    fn render(turns: &[Turn]) -> String {
        let mut lines = vec![SUMMARY_HEADER.to_string()];
        for (i, (user, assistant)) in Self::exchanges(turns).iter().enumerate() {
            lines.push(format!("{}. User asked: {}", i + 1, Self::clause(user)));
            lines.push(format!(
                "   Assistant responded: {}",
                Self::clause(assistant)
            ));
        }
        lines.join("\n")
    }
}

#[async_trait]
impl Summarizer for RuleBasedSummarizer {
    async fn summarize(
        &self,
        turns: &[Turn],
        _target_tokens: usize,
    ) -> Result<String, SummarizerError> {
        Ok(Self::render(turns))
    }
}

/// Configuration for the LLM summarizer
#[derive(Debug, Clone)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8080/v1/chat/completions".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

/// LLM-based summarizer using an OpenAI-compatible API
pub struct LlmSummarizer {
    client: Client,
    config: SummarizerConfig,
}

impl LlmSummarizer {
    /// Create a new LLM summarizer
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizerError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| SummarizerError::InitializationError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// Build summarization prompt from the turns being compacted
    fn build_prompt(&self, turns: &[Turn], target_tokens: usize) -> String {
        let transcript = turns
            .iter()
            .map(|t| format!("{}: {}", t.role, t.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            "Summarize the following conversation turns into a concise running brief. \
            Focus on questions asked, answers given, and decisions made. \
            Keep the summary under {} tokens.\n\n{}",
            target_tokens, transcript
        )
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        turns: &[Turn],
        target_tokens: usize,
    ) -> Result<String, SummarizerError> {
        if turns.is_empty() {
            return Ok(String::new());
        }

        debug!(
            turns = turns.len(),
            target_tokens, "requesting LLM summarization"
        );

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a concise summarizer. Extract key information and compress it efficiently.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.build_prompt(turns, target_tokens),
                },
            ],
            max_tokens: Some(target_tokens),
            temperature: Some(0.3),
        };

        // Retry logic
        let mut last_error = None;
        for attempt in 0..self.config.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for summarization", attempt);
                tokio::time::sleep(Duration::from_millis(100 * (1 << attempt))).await;
            }

            let mut req = self.client.post(&self.config.endpoint).json(&request);

            if let Some(ref api_key) = self.config.api_key {
                req = req.header("Authorization", format!("Bearer {}", api_key));
            }

            match req.send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        last_error =
                            Some(SummarizerError::ApiError(format!("HTTP {}: {}", status, body)));
                        continue;
                    }

                    match response.json::<ChatCompletionResponse>().await {
                        Ok(resp) => {
                            if let Some(choice) = resp.choices.first() {
                                debug!("Summarization successful");
                                return Ok(choice.message.content.clone());
                            } else {
                                last_error = Some(SummarizerError::ApiError(
                                    "No choices in response".to_string(),
                                ));
                            }
                        }
                        Err(e) => {
                            last_error = Some(SummarizerError::ApiError(format!(
                                "Failed to parse response: {}",
                                e
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(SummarizerError::NetworkError(e.to_string()));
                }
            }
        }

        warn!(
            "Summarization failed after {} attempts",
            self.config.max_retries
        );
        Err(last_error.unwrap_or(SummarizerError::Unknown))
    }
}

/// Wrapper that degrades to [`RuleBasedSummarizer`] when the external
/// summarizer is absent, errors, times out, or returns an empty result
///
/// Compaction must never fail merely because an enrichment summarizer is
/// unavailable, so this wrapper's `summarize` is effectively infallible. The
/// engine holds the external capability as a non-owning `Arc` injected at
/// construction and tolerates `None`.
pub struct FallbackSummarizer {
    external: Option<Arc<dyn Summarizer>>,
    timeout: Duration,
    rule_based: RuleBasedSummarizer,
}

impl FallbackSummarizer {
    pub fn new(external: Option<Arc<dyn Summarizer>>, timeout: Duration) -> Self {
        Self {
            external,
            timeout,
            rule_based: RuleBasedSummarizer,
        }
    }

    /// Rule-based only, no external capability
    pub fn rule_based_only() -> Self {
        Self::new(None, Duration::from_secs(30))
    }
}

#[async_trait]
impl Summarizer for FallbackSummarizer {
    async fn summarize(
        &self,
        turns: &[Turn],
        target_tokens: usize,
    ) -> Result<String, SummarizerError> {
        if let Some(external) = &self.external {
            match tokio::time::timeout(self.timeout, external.summarize(turns, target_tokens))
                .await
            {
                Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
                Ok(Ok(_)) => {
                    warn!("external summarizer returned empty output, falling back to rule-based");
                }
                Ok(Err(e)) => {
                    warn!(error = %e, "external summarizer failed, falling back to rule-based");
                }
                Err(_) => {
                    warn!(
                        timeout = ?self.timeout,
                        "external summarizer timed out, falling back to rule-based"
                    );
                }
            }
            METRICS.summarizer_fallbacks.inc();
        }

        self.rule_based.summarize(turns, target_tokens).await
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
