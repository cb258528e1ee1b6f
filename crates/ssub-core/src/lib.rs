//! Core submission logic for ssub.
//!
//! Everything between parsing the command line and calling `sbatch`:
//! resolve parameters, validate them, derive log paths, add the
//! uniquifying seed and hold submission until the cluster has room.

pub mod output;
pub mod params;
pub mod resolve;
pub mod throttle;
pub mod unique;
pub mod validate;

pub use output::{LogPaths, OutputPathError, derive_log_paths};
pub use params::{Param, ParameterSet};
pub use resolve::{ConfigError, DefaultsMap, DefaultsSource, ExplicitParams, Resolver};
pub use throttle::{
    Clock, MAX_POLL_INTERVAL, Throttle, ThrottleConfig, ThrottleError, ThrottleReport,
    TokioClock, UsageProbe,
};
pub use unique::{SEED_LEN, generate_seed, uniquify};
pub use validate::{DEFAULT_GPU_MEM, ValidationError, validate};
