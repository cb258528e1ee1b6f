//! Query the user's aggregate core usage via squeue.

use ssub_core::UsageProbe;
use ssub_parsers::run_command;
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SqueueError {
    #[error("Failed to execute squeue: {0}")]
    ExecutionError(String),
    #[error("Failed to parse squeue output: {0}")]
    ParseError(String),
    #[error("Cannot determine current user: USER is not set")]
    UnknownUser,
}

/// squeue output format: %C - number of CPUs requested or allocated.
const USAGE_FORMAT: &str = "%C";

/// Sum the per-job CPU column. Blank output means no usage.
pub fn parse_usage(stdout: &str) -> Result<u64, SqueueError> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .try_fold(0u64, |total, line| {
            let cpus = line.parse::<u64>().map_err(|_| {
                SqueueError::ParseError(format!("Expected a CPU count, got {line:?}"))
            })?;
            total
                .checked_add(cpus)
                .ok_or_else(|| SqueueError::ParseError("CPU total overflows".to_string()))
        })
}

/// Usage probe that asks squeue about one user's jobs.
#[derive(Debug, Clone)]
pub struct SqueueUsage {
    user: String,
    program: String,
}

impl SqueueUsage {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            program: "squeue".to_string(),
        }
    }

    /// Probe for the user running ssub.
    pub fn for_current_user() -> Result<Self, SqueueError> {
        let user = std::env::var("USER").map_err(|_| SqueueError::UnknownUser)?;
        Ok(Self::new(user))
    }

    /// Use a different squeue executable.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Total cores held by the user's pending and running jobs.
    pub async fn query(&self) -> Result<u64, SqueueError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-u", &self.user, "-h", "-o", USAGE_FORMAT]);

        let stdout = run_command(&mut cmd, "squeue")
            .await
            .map_err(|e| SqueueError::ExecutionError(e.to_string()))?;

        parse_usage(&stdout)
    }
}

impl UsageProbe for SqueueUsage {
    type Error = SqueueError;

    async fn current_usage(&mut self) -> Result<u64, SqueueError> {
        self.query().await
    }
}
