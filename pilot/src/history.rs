use std::collections::VecDeque;

use derive_more::Display;

/// One line of the history that gets sent to the model. Entries are never modified once they are
/// created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct HistoryEntry(String);

impl HistoryEntry {
    /// Describes a decision that was applied on the given tick.
    pub fn decision(tick: u64, reply: &str) -> Self {
        Self(format!("Tick {tick}: I (AI) decided '{reply}'"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for HistoryEntry {
    fn from(entry: String) -> Self {
        Self(entry)
    }
}

impl From<&str> for HistoryEntry {
    fn from(entry: &str) -> Self {
        Self(entry.to_owned())
    }
}

/// A fixed-capacity FIFO of the most recent events. Once full, every new entry pushes out the
/// oldest one.
#[derive(Debug, Clone)]
pub struct RollingHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl RollingHistory {
    /// Creates an empty history. A capacity of zero keeps nothing.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, entry: impl Into<HistoryEntry>) {
        self.entries.push_back(entry.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    /// Joins all of the entries, oldest first, with newlines.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(HistoryEntry::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Iterates over the entries from oldest to newest.
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
}
