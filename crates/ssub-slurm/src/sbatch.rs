//! Submit a job script with sbatch.

use camino::Utf8Path;
use ssub_parsers::{CommandError, run_command};
use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum SbatchError {
    #[error("sbatch failed: {0}")]
    Command(#[from] CommandError),
    #[error("Unexpected sbatch output: {0:?}")]
    UnexpectedOutput(String),
}

/// A job accepted by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub job_id: String,
}

/// Extract the job id from "Submitted batch job 12345" (optionally
/// followed by ";cluster" in parsable mode).
fn parse_job_id(stdout: &str) -> Option<String> {
    let last = stdout.split_whitespace().last()?;
    let id = last.split(';').next()?;
    if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
        Some(id.to_string())
    } else {
        None
    }
}

/// The submit command.
#[derive(Debug, Clone)]
pub struct Sbatch {
    program: String,
}

impl Default for Sbatch {
    fn default() -> Self {
        Self {
            program: "sbatch".to_string(),
        }
    }
}

impl Sbatch {
    /// Use a different sbatch executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Submit `script`. A non-zero exit is an error.
    ///
    /// Dropping the returned future kills sbatch if it is still running.
    pub async fn submit(&self, script: &Utf8Path) -> Result<Submission, SbatchError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(script.as_str()).kill_on_drop(true);

        let stdout = run_command(&mut cmd, "sbatch").await?;
        let job_id = parse_job_id(&stdout).ok_or_else(|| {
            SbatchError::UnexpectedOutput(stdout.trim().to_string())
        })?;

        tracing::debug!("sbatch accepted job {}", job_id);
        Ok(Submission { job_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::time::Duration;
    use tempfile::TempDir;

    /// Write a script that stands in for sbatch's behaviour; run it with `sh`.
    fn fake_script(dir: &TempDir, body: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::from_path_buf(dir.path().join("job.sh")).unwrap();
        std::fs::write(&path, format!("{body}\n")).unwrap();
        path
    }

    #[test]
    fn test_parse_job_id() {
        assert_eq!(
            parse_job_id("Submitted batch job 12345\n"),
            Some("12345".to_string())
        );
        assert_eq!(parse_job_id("12345;cluster\n"), Some("12345".to_string()));
        assert_eq!(parse_job_id(""), None);
        assert_eq!(parse_job_id("sbatch: error"), None);
    }

    #[tokio::test]
    async fn test_submit_success() {
        let dir = TempDir::new().unwrap();
        let script = fake_script(&dir, "echo \"Submitted batch job 42\"");

        let submission = Sbatch::with_program("sh").submit(&script).await.unwrap();
        assert_eq!(submission.job_id, "42");
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let dir = TempDir::new().unwrap();
        let script = fake_script(&dir, "echo 'sbatch: error: invalid partition' >&2; exit 1");

        let err = Sbatch::with_program("sh").submit(&script).await.unwrap_err();
        assert!(matches!(err, SbatchError::Command(CommandError::Failed { .. })));
        assert!(err.to_string().contains("invalid partition"));
    }

    #[tokio::test]
    async fn test_submit_unexpected_output() {
        let dir = TempDir::new().unwrap();
        let script = fake_script(&dir, "echo queued");

        let err = Sbatch::with_program("sh").submit(&script).await.unwrap_err();
        assert!(matches!(err, SbatchError::UnexpectedOutput(_)));
    }

    #[tokio::test]
    async fn test_cancelled_submit_kills_sbatch() {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("queued");
        let script = fake_script(
            &dir,
            &format!("sleep 1; touch '{}'; echo 'Submitted batch job 9'", marker.display()),
        );

        let sbatch = Sbatch::with_program("sh");
        let result =
            tokio::time::timeout(Duration::from_millis(100), sbatch.submit(&script)).await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_submit_missing_program() {
        let err = Sbatch::with_program("nonexistent_sbatch_12345")
            .submit(Utf8Path::new("/tmp/job.sh"))
            .await
            .unwrap_err();
        assert!(matches!(err, SbatchError::Command(CommandError::Execution { .. })));
    }
}
