//! Shared parsing utilities for submission parameters and scheduler output.
//!
//! Used by ssub-core for validation and by ssub-slurm for talking to
//! `sbatch` and `squeue`.

pub mod command;
pub mod memory;
pub mod nodes;
pub mod time;

pub use command::{CommandError, run_command};
pub use memory::{MemorySize, MemoryUnit, ParseMemoryError};
pub use nodes::NodeSet;
pub use time::{format_duration, parse_duration};

/// Filter helper for optional string fields.
/// Returns None if the string is empty after trimming.
pub fn non_empty(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}
