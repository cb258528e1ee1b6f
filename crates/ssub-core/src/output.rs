//! Derivation of the job's stdout/stderr log paths.

use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputPathError {
    #[error("Output path '{0}' must end with .log")]
    NotLogFile(String),
    #[error("Output spec '{0}' must be one path or two comma-separated paths")]
    BadSpec(String),
    #[error("Cannot write log to {0}: parent directory does not exist")]
    MissingParent(Utf8PathBuf),
}

/// Where the job writes stdout and stderr.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogPaths {
    pub output: Utf8PathBuf,
    pub error: Utf8PathBuf,
}

impl LogPaths {
    /// Output and error paths without duplicates.
    pub fn distinct(&self) -> Vec<&Utf8Path> {
        if self.output == self.error {
            vec![&self.output]
        } else {
            vec![&self.output, &self.error]
        }
    }
}

/// Which stream a path is for, when output and error were given separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Combined,
    Output,
    Error,
}

impl Stream {
    fn extension(self) -> &'static str {
        match self {
            Self::Combined => "log",
            Self::Output => "out",
            Self::Error => "err",
        }
    }
}

/// Compute concrete log paths from an optional output specification.
///
/// `spec` is one path (shared by stdout and stderr) or two comma-separated
/// paths. Relative paths are resolved against `cwd`. A path naming an
/// existing directory gets `<job_name>.<ext>` appended.
pub fn derive_log_paths(
    spec: Option<&str>,
    job_name: &str,
    cwd: &Utf8Path,
) -> Result<LogPaths, OutputPathError> {
    let spec = match spec.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => spec,
        None => {
            let path = Utf8PathBuf::from(format!("{job_name}.log"));
            return Ok(LogPaths {
                output: path.clone(),
                error: path,
            });
        }
    };

    // Checked on the whole spec, before splitting.
    if !spec.ends_with(".log") {
        return Err(OutputPathError::NotLogFile(spec.to_string()));
    }

    let tokens: Vec<&str> = spec.split(',').map(str::trim).collect();
    if tokens.iter().any(|t| t.is_empty()) {
        return Err(OutputPathError::BadSpec(spec.to_string()));
    }

    match tokens.as_slice() {
        [single] => {
            let path = resolve_path(single, job_name, Stream::Combined, cwd)?;
            Ok(LogPaths {
                output: path.clone(),
                error: path,
            })
        }
        [output, error] => Ok(LogPaths {
            output: resolve_path(output, job_name, Stream::Output, cwd)?,
            error: resolve_path(error, job_name, Stream::Error, cwd)?,
        }),
        _ => Err(OutputPathError::BadSpec(spec.to_string())),
    }
}

fn resolve_path(
    raw: &str,
    job_name: &str,
    stream: Stream,
    cwd: &Utf8Path,
) -> Result<Utf8PathBuf, OutputPathError> {
    let path = Utf8Path::new(raw);
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    if path.is_file() {
        return Ok(path);
    }

    if path.is_dir() {
        return Ok(path.join(format!("{}.{}", job_name, stream.extension())));
    }

    match path.parent() {
        Some(parent) if parent.is_dir() => Ok(path),
        _ => Err(OutputPathError::MissingParent(path)),
    }
}
