//! Token estimation strategies

use std::sync::Arc;
use tiktoken_rs::{cl100k_base, CoreBPE};

/// Token estimator trait for different tokenization strategies
pub trait TokenEstimator: Send + Sync {
    /// Estimate the number of tokens in the given text
    ///
    /// Must be deterministic and total over all inputs, including the empty
    /// string; the buffer's running counter depends on stable estimates.
    fn estimate(&self, text: &str) -> usize;

    /// Estimate tokens for multiple texts
    fn estimate_batch(&self, texts: &[&str]) -> Vec<usize> {
        texts.iter().map(|t| self.estimate(t)).collect()
    }
}

/// Character-based heuristic estimator (~4 chars per token for English)
///
/// Returns 0 for empty text and `len/4 + 1` otherwise. Intentionally
/// approximate: callers must not assume tokenizer fidelity.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> usize {
        if text.is_empty() {
            return 0;
        }
        text.len() / 4 + 1
    }
}

/// Tiktoken-based estimator using cl100k_base (GPT-4, GPT-3.5-turbo)
///
/// Closer to real model counts than the heuristic, at the cost of a BPE pass
/// per call. Opt-in; the engine defaults to [`HeuristicEstimator`].
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    /// Create a new tiktoken estimator with cl100k_base encoding
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bpe = cl100k_base()?;
        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl TokenEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heuristic_empty_text_is_zero() {
        let estimator = HeuristicEstimator;
        assert_eq!(estimator.estimate(""), 0);
    }

    #[test]
    fn test_heuristic_four_chars_per_token() {
        let estimator = HeuristicEstimator;
        assert_eq!(estimator.estimate("a"), 1);
        assert_eq!(estimator.estimate("abcd"), 2);
        assert_eq!(estimator.estimate("a".repeat(40).as_str()), 11);
    }

    #[test]
    fn test_heuristic_is_stable() {
        let estimator = HeuristicEstimator;
        let text = "Hello, world! This is a test.";
        assert_eq!(estimator.estimate(text), estimator.estimate(text));
    }

    #[test]
    fn test_tiktoken_estimator() {
        let estimator = TiktokenEstimator::new().unwrap();
        let text = "Hello, world! This is a test.";
        let tokens = estimator.estimate(text);
        assert!(tokens > 0);
        assert!(tokens < 20); // Should be around 8-10 tokens
    }

    #[test]
    fn test_batch_estimation() {
        let estimator = HeuristicEstimator;
        let texts = vec!["Hello", "world", ""];
        let tokens = estimator.estimate_batch(&texts);
        assert_eq!(tokens, vec![2, 2, 0]);
    }
}
