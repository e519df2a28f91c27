//! Error taxonomy for the history compactor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HistoryError>;

/// Errors surfaced by this crate
///
/// Summarization failures never reach callers of `add_message`; they degrade
/// to rule-based output inside the engine. What remains is configuration
/// rejection at construction time and internal plumbing failures.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    #[error("Summarizer error: {0}")]
    Summarizer(#[from] crate::history::SummarizerError),

    #[error("Internal error: {0}")]
    Internal(String),
}
