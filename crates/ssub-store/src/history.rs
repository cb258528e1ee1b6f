//! Append-only log of submitted jobs, one `<job_name>\t<output>` per line.

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use thiserror::Error;

/// Entries kept after each append.
pub const MAX_ENTRIES: usize = 500;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Failed to update history {path}: {source}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One submitted job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub job_name: String,
    pub output: Utf8PathBuf,
}

impl HistoryEntry {
    fn to_line(&self) -> String {
        format!("{}\t{}", self.job_name, self.output)
    }

    fn from_line(line: &str) -> Option<Self> {
        let (job_name, output) = line.split_once('\t')?;
        Some(Self {
            job_name: job_name.to_string(),
            output: Utf8PathBuf::from(output),
        })
    }
}

/// The job history file.
#[derive(Debug, Clone)]
pub struct HistoryLog {
    path: Utf8PathBuf,
    max_entries: usize,
}

impl HistoryLog {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_entries: MAX_ENTRIES,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Append an entry, keeping only the most recent [`MAX_ENTRIES`].
    pub fn append(&self, entry: &HistoryEntry) -> Result<(), HistoryError> {
        let mut lines = self.read_lines()?;
        lines.push(entry.to_line());

        let excess = lines.len().saturating_sub(self.max_entries);
        let mut content = lines[excess..].join("\n");
        content.push('\n');

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, content).map_err(|e| self.io_error(e))
    }

    /// The last `n` entries, oldest first.
    pub fn recent(&self, n: usize) -> Result<Vec<HistoryEntry>, HistoryError> {
        let entries: Vec<HistoryEntry> = self
            .read_lines()?
            .iter()
            .filter_map(|line| {
                let entry = HistoryEntry::from_line(line);
                if entry.is_none() {
                    tracing::warn!("Skipping malformed history line: {:?}", line);
                }
                entry
            })
            .collect();

        let skip = entries.len().saturating_sub(n);
        Ok(entries.into_iter().skip(skip).collect())
    }

    fn read_lines(&self) -> Result<Vec<String>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        Ok(content
            .lines()
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
