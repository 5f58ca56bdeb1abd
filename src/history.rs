use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub expression: String,
    /// Formatted result, as shown to the user.
    pub result: String,
    pub at: DateTime<Local>,
}

/// Session history owned by the caller, newest entry first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self { entries: VecDeque::with_capacity(limit), limit }
    }

    /// Records a calculation; the oldest entry is dropped past the limit.
    pub fn push<E: Into<String>, R: Into<String>>(&mut self, expression: E, result: R) {
        self.entries.push_front(HistoryEntry {
            expression: expression.into(),
            result: result.into(),
            at: Local::now(),
        });
        self.entries.truncate(self.limit);
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
