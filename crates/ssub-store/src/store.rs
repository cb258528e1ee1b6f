use crate::paths::SsubPaths;
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use ssub_core::{ConfigError, DefaultsMap, DefaultsSource, Param};
use std::fs;
use thiserror::Error;
use toml::{Table, Value};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    TomlRead(#[from] toml::de::Error),
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
    #[error("Config file not found: {0}")]
    NotFound(Utf8PathBuf),
    #[error("Cannot determine home directory")]
    NoHome,
    #[error("Path is not valid UTF-8: {0}")]
    NonUtf8(String),
}

/// Layout of the defaults file: a single `[defaults]` table.
#[derive(Debug, Default, Serialize, Deserialize)]
struct DefaultsFile {
    #[serde(default)]
    defaults: Table,
}

/// The persisted defaults, found through the pointer file.
pub struct DefaultsStore {
    paths: SsubPaths,
}

impl DefaultsStore {
    pub fn new(paths: SsubPaths) -> Self {
        Self { paths }
    }

    /// The defaults file currently in use.
    ///
    /// Read from the pointer file; falls back to the default location when
    /// the pointer is missing or empty.
    pub fn config_path(&self) -> Result<Utf8PathBuf, StoreError> {
        if !self.paths.pointer.exists() {
            return Ok(self.paths.default_config.clone());
        }
        let content = fs::read_to_string(&self.paths.pointer)?;
        match content.lines().next().map(str::trim) {
            Some(line) if !line.is_empty() => Ok(Utf8PathBuf::from(line)),
            _ => Ok(self.paths.default_config.clone()),
        }
    }

    /// Point ssub at a different defaults file, which must exist.
    pub fn set_config_path(&self, path: &Utf8Path) -> Result<Utf8PathBuf, StoreError> {
        if !path.is_file() {
            return Err(StoreError::NotFound(path.to_path_buf()));
        }
        let absolute = path.canonicalize_utf8()?;
        write_creating_parent(&self.paths.pointer, &format!("{absolute}\n"))?;
        Ok(absolute)
    }

    /// Load the defaults in use.
    ///
    /// A missing file at the default location is generated from the
    /// builtin defaults; a missing custom file is an error.
    pub fn load_defaults(&self) -> Result<DefaultsMap, StoreError> {
        let path = self.config_path()?;

        if !path.exists() {
            if path != self.paths.default_config {
                return Err(StoreError::NotFound(path));
            }
            let defaults = builtin_defaults();
            save_defaults(&path, &defaults)?;
            tracing::info!("Created defaults file {}", path);
            return Ok(defaults);
        }

        let content = fs::read_to_string(&path)?;
        let file: DefaultsFile = toml::from_str(&content)?;
        Ok(to_defaults_map(file.defaults, &path))
    }
}

impl DefaultsSource for DefaultsStore {
    fn load(&self) -> Result<DefaultsMap, ConfigError> {
        self.load_defaults().map_err(|e| match e {
            StoreError::NotFound(path) => ConfigError::NotFound(path.to_string()),
            other => ConfigError::Load {
                path: self
                    .config_path()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|_| self.paths.pointer.to_string()),
                reason: other.to_string(),
            },
        })
    }
}

/// Builtin defaults for every configurable parameter.
pub fn builtin_defaults() -> DefaultsMap {
    Param::ALL
        .into_iter()
        .filter(|p| p.is_configurable())
        .map(|p| (p.key().to_string(), p.builtin_default().to_string()))
        .collect()
}

/// Write a defaults file.
pub fn save_defaults(path: &Utf8Path, defaults: &DefaultsMap) -> Result<(), StoreError> {
    let file = DefaultsFile {
        defaults: defaults
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    };
    write_creating_parent(path, &toml::to_string_pretty(&file)?)
}

fn to_defaults_map(table: Table, path: &Utf8Path) -> DefaultsMap {
    let mut defaults = DefaultsMap::new();

    for (key, value) in table {
        match Param::from_key(&key) {
            Some(param) if param.is_configurable() => {}
            _ => {
                tracing::warn!("Ignoring unknown key '{}' in {}", key, path);
                continue;
            }
        }

        let value = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Boolean(b) => String::from(if b { "1" } else { "0" }),
            other => {
                tracing::warn!("Ignoring non-scalar value for '{}' in {}: {}", key, path, other);
                continue;
            }
        };
        defaults.insert(key, value);
    }

    defaults
}

fn write_creating_parent(path: &Utf8Path, content: &str) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(temp: &TempDir) -> (DefaultsStore, SsubPaths) {
        let dir = Utf8Path::from_path(temp.path()).unwrap().join(".ssub");
        let paths = SsubPaths::in_dir(&dir);
        (DefaultsStore::new(paths.clone()), paths)
    }

    #[test]
    fn test_missing_default_file_is_generated() {
        let temp = TempDir::new().unwrap();
        let (store, paths) = store_in(&temp);

        let defaults = store.load_defaults().unwrap();
        assert!(paths.default_config.exists());
        assert_eq!(defaults.get("mail_type").map(String::as_str), Some("NONE"));
        assert_eq!(defaults.get("ntasks").map(String::as_str), Some("1"));
        assert!(!defaults.contains_key("seed"));

        // Second load reads the generated file back.
        assert_eq!(store.load_defaults().unwrap(), defaults);
    }

    #[test]
    fn test_missing_custom_file_is_fatal() {
        let temp = TempDir::new().unwrap();
        let (store, paths) = store_in(&temp);
        fs::create_dir_all(paths.pointer.parent().unwrap()).unwrap();
        fs::write(&paths.pointer, "/nonexistent/ssub.toml\n").unwrap();

        assert!(matches!(
            store.load_defaults(),
            Err(StoreError::NotFound(p)) if p == "/nonexistent/ssub.toml"
        ));
        assert!(matches!(
            DefaultsSource::load(&store),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_empty_pointer_uses_default() {
        let temp = TempDir::new().unwrap();
        let (store, paths) = store_in(&temp);
        fs::create_dir_all(paths.pointer.parent().unwrap()).unwrap();
        fs::write(&paths.pointer, "\n").unwrap();

        assert_eq!(store.config_path().unwrap(), paths.default_config);
    }

    #[test]
    fn test_load_custom_file_with_mixed_values() {
        let temp = TempDir::new().unwrap();
        let (store, _) = store_in(&temp);
        let custom = Utf8Path::from_path(temp.path()).unwrap().join("lab.toml");
        fs::write(
            &custom,
            r#"
[defaults]
partition = "gpu"
cpus_per_task = 8
no_unique = true
seed = "fixed"
colour = "blue"
"#,
        )
        .unwrap();

        store.set_config_path(&custom).unwrap();
        let defaults = store.load_defaults().unwrap();

        assert_eq!(defaults.get("partition").map(String::as_str), Some("gpu"));
        assert_eq!(defaults.get("cpus_per_task").map(String::as_str), Some("8"));
        assert_eq!(defaults.get("no_unique").map(String::as_str), Some("1"));
        assert!(!defaults.contains_key("seed"));
        assert!(!defaults.contains_key("colour"));
    }

    #[test]
    fn test_set_config_path_requires_file() {
        let temp = TempDir::new().unwrap();
        let (store, paths) = store_in(&temp);
        let missing = Utf8Path::from_path(temp.path()).unwrap().join("missing.toml");

        assert!(matches!(
            store.set_config_path(&missing),
            Err(StoreError::NotFound(_))
        ));
        assert!(!paths.pointer.exists());
    }

    #[test]
    fn test_malformed_file_reports_load_error() {
        let temp = TempDir::new().unwrap();
        let (store, paths) = store_in(&temp);
        fs::create_dir_all(paths.default_config.parent().unwrap()).unwrap();
        fs::write(&paths.default_config, "[defaults\npartition = ").unwrap();

        assert!(matches!(
            store.load_defaults(),
            Err(StoreError::TomlRead(_))
        ));
        assert!(matches!(
            DefaultsSource::load(&store),
            Err(ConfigError::Load { .. })
        ));
    }
}
