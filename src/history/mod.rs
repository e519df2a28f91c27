//! Conversation history with token-budgeted compaction
//!
//! The engine keeps the most recent exchanges intact and folds older turns
//! into a single System summary at the head of the buffer, so the total
//! estimated token count tracks a configured ceiling under append-only
//! mutation.

pub mod buffer;
pub mod engine;
pub mod models;
pub mod summarizer;
pub mod token_estimator;
pub mod window;

pub use buffer::HistoryBuffer;
pub use engine::{CompactionEngine, CompactionPolicy};
pub use models::{Role, Turn};
pub use summarizer::{
    FallbackSummarizer, LlmSummarizer, RuleBasedSummarizer, Summarizer, SummarizerConfig,
    SummarizerError, SUMMARY_HEADER,
};
pub use token_estimator::{HeuristicEstimator, TiktokenEstimator, TokenEstimator};
pub use window::SlidingWindow;
