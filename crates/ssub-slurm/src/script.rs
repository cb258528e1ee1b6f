//! Batch script rendering and the on-disk script file.

use camino::{Utf8Path, Utf8PathBuf};
use ssub_core::ParameterSet;
use std::fmt;
use std::io::{self, Write};

const INTERPRETER: &str = "#!/bin/bash";

/// A rendered sbatch script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobScript {
    text: String,
}

impl JobScript {
    /// Render the directives for `params` followed by the timed command.
    ///
    /// Every directive is emitted even when its value is empty; the GPU
    /// directives only appear when GPUs were requested.
    pub fn render(params: &ParameterSet, command: &str) -> Self {
        let mut directives: Vec<(&str, String)> = vec![
            ("job-name", params.job_name.clone()),
            ("output", params.logs.output.to_string()),
            ("error", params.logs.error.to_string()),
            ("partition", params.partition.clone()),
            ("account", params.account.clone()),
            ("nodes", params.nodes.clone()),
            ("ntasks", params.ntasks.clone()),
            ("cpus-per-task", params.cpus_per_task.clone()),
            ("time", params.time.clone()),
            ("mem", params.mem.clone()),
            ("open-mode", "append".to_string()),
            ("nodelist", params.nodelist.clone()),
            ("exclude", params.exclude.clone()),
            ("mail-user", params.mail_user.clone()),
            ("mail-type", params.mail_type.clone()),
        ];

        if params.gpus_requested() {
            directives.push(("gpus", params.gpus.clone()));
            directives.push(("mem-per-gpu", params.gpu_mem.clone()));
        }

        let mut text = String::from(INTERPRETER);
        text.push('\n');
        for (option, value) in directives {
            text.push_str(&format!("#SBATCH --{option}={value}\n"));
        }
        text.push_str(&format!("time {command}\n"));

        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Write to a fresh temporary file.
    pub fn write_temp(&self, keep: bool) -> io::Result<ScriptFile> {
        let mut file = tempfile::Builder::new()
            .prefix("ssub-")
            .suffix(".sh")
            .tempfile()?;
        file.write_all(self.text.as_bytes())?;

        let (_, path) = file.keep().map_err(|e| e.error)?;
        let path = Utf8PathBuf::from_path_buf(path).map_err(|p| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("Temporary path is not UTF-8: {}", p.display()),
            )
        })?;

        Ok(ScriptFile { path, keep })
    }

    /// Write to a caller-chosen path.
    pub fn write_to(&self, path: &Utf8Path, keep: bool) -> io::Result<ScriptFile> {
        std::fs::write(path, &self.text)?;
        Ok(ScriptFile {
            path: path.to_path_buf(),
            keep,
        })
    }
}

impl fmt::Display for JobScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// A script on disk, removed on drop unless it is kept.
#[derive(Debug)]
pub struct ScriptFile {
    path: Utf8PathBuf,
    keep: bool,
}

impl ScriptFile {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn is_kept(&self) -> bool {
        self.keep
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove script {}: {}", self.path, e);
            }
        }
    }
}
