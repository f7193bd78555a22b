//! Bounded, newest-first log of completed evaluations.

use crate::types::HistoryEntry;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

#[derive(Debug, Clone)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `entry`, evicting the oldest one if the log is full.
    pub fn push(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_back() {
                tracing::trace!(expression = %evicted.expression, "history entry evicted");
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Index 0 is the newest entry.
    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn to_vec(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            expression: format!("{} + 0", n),
            result: n.to_string(),
        }
    }

    #[test]
    fn test_newest_first() {
        let mut log = HistoryLog::new();
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.get(0).unwrap().result, "2");
        assert_eq!(log.get(1).unwrap().result, "1");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut log = HistoryLog::new();
        for n in 1..=21 {
            log.push(entry(n));
        }
        assert_eq!(log.len(), 20);
        assert_eq!(log.get(0).unwrap().result, "21");
        assert_eq!(log.get(19).unwrap().result, "2");
        assert!(log.iter().all(|e| e.result != "1"));
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let mut log = HistoryLog::with_capacity(0);
        log.push(entry(1));
        log.push(entry(2));
        assert_eq!(log.capacity(), 1);
        assert_eq!(log.to_vec(), vec![entry(2)]);
    }

    #[test]
    fn test_clear() {
        let mut log = HistoryLog::new();
        log.push(entry(1));
        log.clear();
        assert!(log.is_empty());
        assert!(log.get(0).is_none());
    }
}
