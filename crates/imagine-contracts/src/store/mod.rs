pub mod history;
pub mod state;

pub use history::{HistoryEntry, HistoryStore, VariantRecord, HISTORY_CAP, HISTORY_KEY};
pub use state::StateStore;
