//! Mark each submission in the job's log files.

use chrono::{DateTime, TimeZone};
use ssub_core::LogPaths;
use std::fmt::Display;
use std::fs::OpenOptions;
use std::io::{self, Write};

/// Append a submission header to every distinct log file.
///
/// A blank separator line goes first when the file already has content.
pub fn annotate_logs<Tz>(logs: &LogPaths, command: &str, at: DateTime<Tz>) -> io::Result<()>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let stamp = at.format("%Y-%m-%d %H:%M:%S");

    for path in logs.distinct() {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        if file.metadata()?.len() > 0 {
            writeln!(file)?;
        }
        writeln!(file, "# Submitted at {stamp}")?;
        writeln!(file, "# Command: {command}")?;
    }

    Ok(())
}
