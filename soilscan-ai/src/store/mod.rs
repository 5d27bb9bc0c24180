//! Local persistence

pub mod history;

pub use history::{HistoryStatistics, HistoryStore, MAX_RECORDS};
