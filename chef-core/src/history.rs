//! Bounded log of approved meal plans

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of plans kept
pub const MAX_HISTORY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Local>,
    pub plan: String,
}

/// Approved plans, oldest first. Pushing past [`MAX_HISTORY`] evicts the
/// oldest entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MealHistory {
    entries: VecDeque<HistoryEntry>,
}

impl MealHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plan: impl Into<String>) {
        self.entries.push_back(HistoryEntry {
            timestamp: Local::now(),
            plan: plan.into(),
        });
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
