//! On-disk state for ssub: the defaults file, the job history and the
//! annotations written into job logs.

pub mod annotate;
pub mod history;
pub mod paths;
pub mod store;

pub use annotate::annotate_logs;
pub use history::{HistoryEntry, HistoryError, HistoryLog, MAX_ENTRIES};
pub use paths::SsubPaths;
pub use store::{DefaultsStore, StoreError};
