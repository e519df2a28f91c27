//! Compaction engine enforcing the token budget on every mutation

use super::buffer::HistoryBuffer;
use super::models::{Role, Turn};
use super::summarizer::{FallbackSummarizer, Summarizer};
use super::token_estimator::{HeuristicEstimator, TokenEstimator};
use crate::error::{HistoryError, Result};
use crate::metrics::METRICS;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Immutable compaction policy, validated at construction
#[derive(Debug, Clone)]
pub struct CompactionPolicy {
    /// Maximum estimated tokens the buffer should hold
    pub max_token_limit: usize,
    /// Number of most recent exchanges (User+Assistant pairs) preserved intact
    pub recent_message_count: usize,
    /// Advisory target ratio of summary size to summarized size, in (0, 1]
    pub summarization_ratio: f32,
}

impl CompactionPolicy {
    pub fn new(
        max_token_limit: usize,
        recent_message_count: usize,
        summarization_ratio: f32,
    ) -> Result<Self> {
        let policy = Self {
            max_token_limit,
            recent_message_count,
            summarization_ratio,
        };
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_token_limit == 0 {
            return Err(HistoryError::Configuration(
                "max_token_limit must be positive".to_string(),
            ));
        }
        if !(self.summarization_ratio > 0.0 && self.summarization_ratio <= 1.0) {
            return Err(HistoryError::Configuration(format!(
                "summarization_ratio must be in (0, 1], got {}",
                self.summarization_ratio
            )));
        }
        Ok(())
    }

    /// Raw turn count covered by the recency window
    fn preserved_turns(&self) -> usize {
        self.recent_message_count * 2
    }
}

impl Default for CompactionPolicy {
    fn default() -> Self {
        Self {
            max_token_limit: 4000,
            recent_message_count: 5,
            summarization_ratio: 0.3,
        }
    }
}

/// Token-budgeted conversation history
///
/// Owns the buffer and enforces the policy on every `add_message`: when the
/// projected total exceeds the limit, aged turns are folded into a single
/// System summary at the head before the new turn is appended. One engine
/// serves one conversation stream; all mutations run under a single lock so
/// the check-compact-append sequence is atomic for concurrent callers.
pub struct CompactionEngine {
    policy: CompactionPolicy,
    estimator: Arc<dyn TokenEstimator>,
    summarizer: FallbackSummarizer,
    buffer: Mutex<HistoryBuffer>,
}

impl CompactionEngine {
    /// Create an engine with an optional external summarization capability
    ///
    /// The external summarizer is held as a non-owning reference; its absence
    /// or failure degrades to rule-based summarization, never to an error.
    pub fn new(
        policy: CompactionPolicy,
        estimator: Arc<dyn TokenEstimator>,
        external_summarizer: Option<Arc<dyn Summarizer>>,
        summarizer_timeout: Duration,
    ) -> Result<Self> {
        policy.validate()?;
        Ok(Self {
            policy,
            estimator,
            summarizer: FallbackSummarizer::new(external_summarizer, summarizer_timeout),
            buffer: Mutex::new(HistoryBuffer::new()),
        })
    }

    /// Rule-based-only engine with the default heuristic estimator
    pub fn with_policy(policy: CompactionPolicy) -> Result<Self> {
        Self::new(
            policy,
            Arc::new(HeuristicEstimator),
            None,
            Duration::from_secs(30),
        )
    }

    pub fn policy(&self) -> &CompactionPolicy {
        &self.policy
    }

    /// Append a turn, compacting first if the projected total is over budget
    ///
    /// Never fails: compaction is best-effort pressure relief, and a message
    /// too large to fit even after compaction is still appended (transient
    /// overshoot is logged and counted, user input is never dropped).
    pub async fn add_message(&self, role: Role, content: impl Into<String>) {
        let content = content.into();
        let new_tokens = self.estimator.estimate(&content);

        let mut buffer = self.buffer.lock().await;

        if buffer.estimated_tokens() + new_tokens > self.policy.max_token_limit {
            debug!(
                current = buffer.estimated_tokens(),
                incoming = new_tokens,
                limit = self.policy.max_token_limit,
                "projected size over budget, compacting"
            );
            self.compact_locked(&mut buffer).await;

            if buffer.estimated_tokens() + new_tokens > self.policy.max_token_limit {
                METRICS.budget_overshoots.inc();
                warn!(
                    current = buffer.estimated_tokens(),
                    incoming = new_tokens,
                    limit = self.policy.max_token_limit,
                    "buffer exceeds budget after compaction, appending anyway"
                );
            }
        }

        buffer.append(Turn::new(role, content, new_tokens));
    }

    /// Convenience wrapper for user turns
    pub async fn add_user_message(&self, content: impl Into<String>) {
        self.add_message(Role::User, content).await;
    }

    /// Convenience wrapper for assistant turns
    pub async fn add_assistant_message(&self, content: impl Into<String>) {
        self.add_message(Role::Assistant, content).await;
    }

    /// Fold aged turns into a single summary turn at the head
    ///
    /// Idempotent and safe to call speculatively: a buffer already within the
    /// recency window is left untouched. Returns true if the buffer changed.
    pub async fn compact(&self) -> bool {
        let mut buffer = self.buffer.lock().await;
        self.compact_locked(&mut buffer).await
    }

    async fn compact_locked(&self, buffer: &mut HistoryBuffer) -> bool {
        if buffer.len() <= self.policy.preserved_turns() {
            return false;
        }

        let preserve_start = buffer.len().saturating_sub(self.policy.preserved_turns());
        let turns = buffer.turns();
        // A head summary from a prior pass lands in to_summarize and is
        // re-folded, so at most one summary turn ever survives.
        let to_summarize = turns[..preserve_start].to_vec();
        let to_keep = turns[preserve_start..].to_vec();

        if to_summarize.is_empty() {
            return false;
        }
        // Nothing new to fold: re-summarizing a lone summary would only erode
        // it. This keeps back-to-back compact() calls convergent.
        if to_summarize.len() == 1 && to_summarize[0].is_summary() {
            return false;
        }

        let old_tokens: usize = to_summarize.iter().map(|t| t.token_count).sum();
        let target_tokens =
            ((old_tokens as f32 * self.policy.summarization_ratio).ceil() as usize).max(1);

        let timer = METRICS.compaction_duration.start_timer();
        // FallbackSummarizer only errs if rule-based could, which it cannot.
        let summary_text = match self.summarizer.summarize(&to_summarize, target_tokens).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "summarization failed with no fallback output, skipping compaction");
                timer.observe_duration();
                return false;
            }
        };
        timer.observe_duration();

        let summary_tokens = self.estimator.estimate(&summary_text);
        let expected_total = buffer.estimated_tokens() - old_tokens + summary_tokens;

        let mut new_sequence = Vec::with_capacity(to_keep.len() + 1);
        new_sequence.push(Turn::new(Role::System, summary_text, summary_tokens));
        new_sequence.extend(to_keep);
        buffer.replace(new_sequence);

        // Delta accounting and the recomputed counter must agree; the
        // recomputed value wins if they ever drift.
        if buffer.estimated_tokens() != expected_total {
            warn!(
                recomputed = buffer.estimated_tokens(),
                expected = expected_total,
                "token counter drift detected during compaction"
            );
        }

        METRICS.compactions.inc();
        info!(
            summarized = to_summarize.len(),
            kept = buffer.len() - 1,
            old_tokens,
            summary_tokens,
            total = buffer.estimated_tokens(),
            "compacted history"
        );
        true
    }

    /// Ordered copy of the current turns, for read-only inspection
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.buffer.lock().await.snapshot()
    }

    /// Current running token estimate
    pub async fn estimated_tokens(&self) -> usize {
        self.buffer.lock().await.estimated_tokens()
    }
}
