//! SLURM integration for ssub.
//!
//! Render job scripts, submit them with sbatch and query usage via squeue.

pub mod sbatch;
pub mod script;
pub mod squeue;

pub use sbatch::{Sbatch, SbatchError, Submission};
pub use script::{JobScript, ScriptFile};
pub use squeue::{SqueueError, SqueueUsage, parse_usage};
