use camino::{Utf8Path, Utf8PathBuf};

use crate::store::StoreError;

/// Locations of ssub's own files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsubPaths {
    /// Single-line file naming the defaults file in use.
    pub pointer: Utf8PathBuf,
    /// Defaults file used when the pointer is missing or empty.
    pub default_config: Utf8PathBuf,
    /// Job history log.
    pub history: Utf8PathBuf,
}

impl SsubPaths {
    /// Lay out all files inside `dir`.
    pub fn in_dir(dir: &Utf8Path) -> Self {
        Self {
            pointer: dir.join("config_path"),
            default_config: dir.join("defaults.toml"),
            history: dir.join("history"),
        }
    }

    /// Files under `~/.ssub`.
    pub fn from_home() -> Result<Self, StoreError> {
        let home = dirs::home_dir().ok_or(StoreError::NoHome)?;
        let home = Utf8PathBuf::from_path_buf(home)
            .map_err(|p| StoreError::NonUtf8(p.display().to_string()))?;
        Ok(Self::in_dir(&home.join(".ssub")))
    }
}
