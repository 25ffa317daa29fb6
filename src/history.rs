use crate::turn::Turn;

/// Default number of user/assistant exchanges retained per contact.
pub const DEFAULT_MAX_TURNS: usize = 6;

/// Sliding-window retention for a contact's turns.
///
/// `max_turns` counts exchanges, so up to `2 * max_turns` turns are kept.
/// At least two turns always survive so one full exchange remains even when
/// `max_turns` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPolicy {
    max_turns: usize,
}

impl Default for HistoryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TURNS)
    }
}

impl HistoryPolicy {
    pub fn new(max_turns: usize) -> Self {
        Self { max_turns }
    }

    /// Maximum number of turns a session may hold.
    pub fn capacity(&self) -> usize {
        self.max_turns.saturating_mul(2).max(2)
    }

    /// Drop the oldest turns until `turns` fits within [`capacity`](Self::capacity).
    pub fn trim(&self, turns: &mut Vec<Turn>) {
        let cap = self.capacity();
        if turns.len() > cap {
            let excess = turns.len() - cap;
            turns.drain(..excess);
        }
    }

    /// Append `turn` and trim.
    pub fn push(&self, turns: &mut Vec<Turn>, turn: Turn) {
        turns.push(turn);
        self.trim(turns);
    }
}
