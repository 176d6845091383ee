use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{AlertCategory, AlertEntry};

/// Per-category, size-bounded, append-only alert log with FIFO eviction.
#[derive(Clone, Debug)]
pub struct AlertLedger {
    capacity: usize,
    critical: VecDeque<AlertEntry>,
    warning: VecDeque<AlertEntry>,
    evolution: VecDeque<AlertEntry>,
    recovery: VecDeque<AlertEntry>,
}

/// Recent alerts grouped by category, oldest first within each list.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertsByCategory {
    pub critical: Vec<AlertEntry>,
    pub warning: Vec<AlertEntry>,
    pub evolution: Vec<AlertEntry>,
    pub recovery: Vec<AlertEntry>,
}

impl AlertLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            critical: VecDeque::with_capacity(capacity),
            warning: VecDeque::with_capacity(capacity),
            evolution: VecDeque::with_capacity(capacity),
            recovery: VecDeque::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn list(&self, category: AlertCategory) -> &VecDeque<AlertEntry> {
        match category {
            AlertCategory::Critical => &self.critical,
            AlertCategory::Warning => &self.warning,
            AlertCategory::Evolution => &self.evolution,
            AlertCategory::Recovery => &self.recovery,
        }
    }

    fn list_mut(&mut self, category: AlertCategory) -> &mut VecDeque<AlertEntry> {
        match category {
            AlertCategory::Critical => &mut self.critical,
            AlertCategory::Warning => &mut self.warning,
            AlertCategory::Evolution => &mut self.evolution,
            AlertCategory::Recovery => &mut self.recovery,
        }
    }

    /// O(1) append into the entry's own category; evicts the oldest at capacity.
    pub fn append(&mut self, entry: AlertEntry) {
        let cap = self.capacity;
        let list = self.list_mut(entry.category);
        if list.len() == cap {
            list.pop_front();
        }
        list.push_back(entry);
    }

    pub fn push(
        &mut self,
        category: AlertCategory,
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
        payload: Value,
    ) {
        self.append(AlertEntry::new(timestamp, category, message, payload));
    }

    /// Last `n` entries of a category, most-recent last.
    pub fn recent(&self, category: AlertCategory, n: usize) -> Vec<AlertEntry> {
        let list = self.list(category);
        let skip = list.len().saturating_sub(n);
        list.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self, category: AlertCategory) -> usize {
        self.list(category).len()
    }

    pub fn is_empty(&self) -> bool {
        AlertCategory::ALL.iter().all(|c| self.list(*c).is_empty())
    }

    pub fn clear(&mut self) {
        for c in AlertCategory::ALL {
            self.list_mut(c).clear();
        }
    }

    /// Last `n` of every category.
    pub fn recent_all(&self, n: usize) -> AlertsByCategory {
        AlertsByCategory {
            critical: self.recent(AlertCategory::Critical, n),
            warning: self.recent(AlertCategory::Warning, n),
            evolution: self.recent(AlertCategory::Evolution, n),
            recovery: self.recent(AlertCategory::Recovery, n),
        }
    }
}
