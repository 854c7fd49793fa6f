//! In-session conversation history
//!
//! Holds the turns of the active conversation only. Nothing is written
//! anywhere: the history lives and dies with the ConversationState value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Oldest turns are discarded past this point; the responder only ever
/// sees a small recent window anyway.
const MAX_RETAINED_TURNS: usize = 50;

/// Role of a turn's author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Agent,
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub timestamp: DateTime<Utc>,
    pub role: TurnRole,
    pub content: String,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            content: content.into(),
        }
    }
}

/// Turn log for one session (VecDeque for cheap front eviction)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationHistory {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    turns: VecDeque<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            updated_at: Utc::now(),
            turns: VecDeque::new(),
        }
    }

    /// Append a turn, evicting the oldest once the retention cap is hit.
    pub fn push(&mut self, turn: Turn) {
        if self.turns.len() >= MAX_RETAINED_TURNS {
            self.turns.pop_front();
        }
        self.turns.push_back(turn);
        self.updated_at = Utc::now();
    }

    /// Iterate over all retained turns, oldest first
    pub fn turns(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// The N most recent turns, oldest first (for prompt assembly)
    pub fn recent(&self, count: usize) -> Vec<&Turn> {
        let skip = self.turns.len().saturating_sub(count);
        self.turns.iter().skip(skip).collect()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
        self.updated_at = Utc::now();
    }
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_recent() {
        let mut history = ConversationHistory::new();
        for i in 0..10 {
            history.push(Turn::new(TurnRole::User, format!("turn {}", i)));
        }

        assert_eq!(history.len(), 10);

        let recent = history.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].content, "turn 7");
        assert_eq!(recent[2].content, "turn 9");
    }

    #[test]
    fn test_recent_window_larger_than_history() {
        let mut history = ConversationHistory::new();
        history.push(Turn::new(TurnRole::User, "only"));

        let recent = history.recent(6);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_retention_cap() {
        let mut history = ConversationHistory::new();
        for i in 0..(MAX_RETAINED_TURNS + 5) {
            history.push(Turn::new(TurnRole::Agent, format!("turn {}", i)));
        }

        assert_eq!(history.len(), MAX_RETAINED_TURNS);
        // Oldest entries were evicted first.
        assert_eq!(history.turns().next().unwrap().content, "turn 5");
    }
}
