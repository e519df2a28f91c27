//! Ordered turn storage with a running token counter

use super::models::Turn;
use tracing::debug;

/// Ordered sequence of turns plus a running size estimate
///
/// Insertion order is chronological order. The counter must always equal the
/// sum of `token_count` over the held turns; `replace` recomputes it from
/// scratch rather than trusting a caller-supplied delta, which guards against
/// drift across compaction passes.
#[derive(Debug, Default)]
pub struct HistoryBuffer {
    turns: Vec<Turn>,
    estimated_token_count: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn to the tail and bump the counter
    pub fn append(&mut self, turn: Turn) {
        self.estimated_token_count += turn.token_count;
        self.turns.push(turn);
        debug!(
            turns = self.turns.len(),
            estimated_tokens = self.estimated_token_count,
            "appended turn"
        );
    }

    /// Read-only view of the held turns, in order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Clone of the ordered sequence for read-only inspection
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    /// Atomically swap the held sequence, recomputing the counter
    pub fn replace(&mut self, new_sequence: Vec<Turn>) {
        self.estimated_token_count = new_sequence.iter().map(|t| t.token_count).sum();
        self.turns = new_sequence;
        debug!(
            turns = self.turns.len(),
            estimated_tokens = self.estimated_token_count,
            "replaced buffer contents"
        );
    }

    pub fn estimated_tokens(&self) -> usize {
        self.estimated_token_count
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::models::Role;

    fn turn(role: Role, content: &str, tokens: usize) -> Turn {
        Turn::new(role, content, tokens)
    }

    #[test]
    fn test_append_updates_counter() {
        let mut buffer = HistoryBuffer::new();
        buffer.append(turn(Role::User, "hello", 2));
        buffer.append(turn(Role::Assistant, "hi there", 3));
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.estimated_tokens(), 5);
    }

    #[test]
    fn test_counter_matches_sum_after_every_append() {
        let mut buffer = HistoryBuffer::new();
        for i in 0..10 {
            buffer.append(turn(Role::User, "msg", i));
            let sum: usize = buffer.turns().iter().map(|t| t.token_count).sum();
            assert_eq!(buffer.estimated_tokens(), sum);
        }
    }

    #[test]
    fn test_replace_recomputes_counter() {
        let mut buffer = HistoryBuffer::new();
        buffer.append(turn(Role::User, "a", 10));
        buffer.append(turn(Role::Assistant, "b", 10));

        buffer.replace(vec![turn(Role::System, "summary", 3)]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.estimated_tokens(), 3);
    }

    #[test]
    fn test_snapshot_preserves_order() {
        let mut buffer = HistoryBuffer::new();
        buffer.append(turn(Role::User, "first", 2));
        buffer.append(turn(Role::Assistant, "second", 2));
        let snap = buffer.snapshot();
        assert_eq!(snap[0].content, "first");
        assert_eq!(snap[1].content, "second");
    }
}
