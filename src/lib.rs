//! Token-budgeted conversation history with sliding-window compaction
//!
//! Keeps the most recent exchanges of a conversation intact while folding
//! older turns into a single summary, so the estimated token count of the
//! whole history tracks a configured ceiling. Summarization is pluggable: a
//! rule-based strategy is always available, and an optional OpenAI-compatible
//! LLM summarizer degrades to it on any failure.
//!
//! ```no_run
//! use history_compactor::{CompactionEngine, CompactionPolicy};
//!
//! # async fn demo() -> history_compactor::Result<()> {
//! let engine = CompactionEngine::with_policy(CompactionPolicy {
//!     max_token_limit: 4000,
//!     recent_message_count: 5,
//!     summarization_ratio: 0.3,
//! })?;
//!
//! engine.add_user_message("Plan me a day trip.").await;
//! engine.add_assistant_message("Sure, here is an itinerary.").await;
//! let turns = engine.snapshot().await;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod history;
pub mod metrics;

pub use config::Config;
pub use error::{HistoryError, Result};
pub use history::{
    CompactionEngine, CompactionPolicy, FallbackSummarizer, HeuristicEstimator, HistoryBuffer,
    LlmSummarizer, Role, RuleBasedSummarizer, SlidingWindow, Summarizer, SummarizerConfig,
    SummarizerError, TiktokenEstimator, TokenEstimator, Turn, SUMMARY_HEADER,
};
