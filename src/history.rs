//! Recent question/answer pairs, kept in memory for the chat surface.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub query: String,
    pub answer: String,
}

/// Bounded log of exchanges; the oldest entry is dropped once full.
#[derive(Debug)]
pub struct ConversationHistory {
    entries: VecDeque<Exchange>,
    capacity: usize,
}

impl Default for ConversationHistory {
    fn default() -> Self {
        Self::with_capacity(HISTORY_LIMIT)
    }
}

impl ConversationHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, query: impl Into<String>, answer: impl Into<String>) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Exchange {
            query: query.into(),
            answer: answer.into(),
        });
    }

    /// Oldest first.
    pub fn recent(&self) -> Vec<Exchange> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
