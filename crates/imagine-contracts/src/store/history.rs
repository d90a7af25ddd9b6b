use serde::{Deserialize, Serialize};

use super::state::StateStore;
use crate::params::GenerationParameters;

pub const HISTORY_KEY: &str = "imagine.history.v1";
pub const HISTORY_CAP: usize = 50;

/// One (model, seed) combination produced by a generate action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub label: String,
    pub model: String,
    pub seed: i64,
    pub url: String,
}

/// Snapshot of one generate action, newest entries first in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub created_at: String,
    pub url: String,
    pub variants: Vec<VariantRecord>,
    pub parameters: GenerationParameters,
}

/// Bounded persisted history on top of [`StateStore`]. Hydrates once at
/// construction; a malformed document yields an empty history rather than
/// an error, since history is a convenience, not correctness-critical.
#[derive(Debug)]
pub struct HistoryStore {
    state: StateStore,
    entries: Vec<HistoryEntry>,
}

impl HistoryStore {
    pub fn new(state: StateStore) -> Self {
        let entries = state
            .get::<Vec<HistoryEntry>>(HISTORY_KEY)
            .unwrap_or_default();
        Self { state, entries }
    }

    /// Prepends an entry and persists the capped sequence in one write.
    pub fn push(&mut self, entry: HistoryEntry) -> anyhow::Result<()> {
        self.entries.insert(0, entry);
        self.entries.truncate(HISTORY_CAP);
        self.state.set(HISTORY_KEY, &self.entries)
    }

    /// Newest-first.
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.entries.clear();
        self.state.remove(HISTORY_KEY)
    }
}
