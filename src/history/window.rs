//! Count-based sliding window, the simpler sibling of the token-budgeted engine

use super::models::Turn;

/// Bounds history by exchange count instead of estimated tokens
///
/// Keeps any System summary turns at the head out of the window count and
/// drops the oldest conversational turns beyond the last `window_size`
/// exchanges. Useful when callers want a hard cap on turn count without
/// token accounting.
#[derive(Debug, Clone, Copy)]
pub struct SlidingWindow {
    window_size: usize,
}

impl SlidingWindow {
    pub fn new(window_size: usize) -> Self {
        Self { window_size }
    }

    /// Trim `turns` to head summaries plus the last `window_size` exchanges
    pub fn apply(&self, turns: Vec<Turn>) -> Vec<Turn> {
        let head_summaries = turns.iter().take_while(|t| t.is_summary()).count();
        let conversation = &turns[head_summaries..];
        let keep = self.window_size * 2;

        if conversation.len() <= keep {
            return turns;
        }

        let start = conversation.len() - keep;
        let mut result: Vec<Turn> = turns[..head_summaries].to_vec();
        result.extend_from_slice(&conversation[start..]);
        result
    }
}
