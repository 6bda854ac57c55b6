//! History abstraction driven by guards and the callback flow

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    Push,
    /// Overwrite the current entry so back-navigation skips it
    Replace,
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &str, mode: HistoryMode);

    fn current(&self) -> Option<String>;
}

/// In-memory history stack
#[derive(Debug, Default)]
pub struct MemoryHistory {
    entries: Mutex<Vec<String>>,
}

impl MemoryHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// History whose current entry is `location`
    #[must_use]
    pub fn starting_at(location: impl Into<String>) -> Self {
        Self {
            entries: Mutex::new(vec![location.into()]),
        }
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pop the current entry and return the one now on top
    pub fn back(&self) -> Option<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() > 1 {
            entries.pop();
        }
        entries.last().cloned()
    }
}

impl Navigator for MemoryHistory {
    fn navigate(&self, target: &str, mode: HistoryMode) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if mode == HistoryMode::Replace {
            entries.pop();
        }
        entries.push(target.to_string());
    }

    fn current(&self) -> Option<String> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }
}
