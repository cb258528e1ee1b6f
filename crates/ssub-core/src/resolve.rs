//! Three-tier parameter resolution: explicit > configured default > builtin.

use crate::params::{Param, ParameterSet};
use crate::unique::generate_seed;
use once_cell::unsync::OnceCell;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Defaults file contents, keyed by [`Param::key`].
pub type DefaultsMap = BTreeMap<String, String>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),
    #[error("Failed to load config {path}: {reason}")]
    Load { path: String, reason: String },
    #[error("Invalid value for {key}: '{value}' is not an integer")]
    InvalidFlag { key: &'static str, value: String },
}

/// Where configured defaults come from.
pub trait DefaultsSource {
    fn load(&self) -> Result<DefaultsMap, ConfigError>;
}

impl DefaultsSource for DefaultsMap {
    fn load(&self) -> Result<DefaultsMap, ConfigError> {
        Ok(self.clone())
    }
}

/// Values given explicitly by the caller.
#[derive(Debug, Clone, Default)]
pub struct ExplicitParams {
    values: HashMap<Param, String>,
}

impl ExplicitParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value; `None` leaves the parameter to the lower tiers.
    pub fn set(&mut self, param: Param, value: Option<impl Into<String>>) -> &mut Self {
        if let Some(value) = value {
            self.values.insert(param, value.into());
        }
        self
    }

    pub fn get(&self, param: Param) -> Option<&str> {
        self.values.get(&param).map(String::as_str)
    }
}

/// Resolves every [`Param`] to exactly one value.
///
/// The defaults source is loaded at most once, on the first parameter the
/// caller did not set.
pub struct Resolver<S> {
    explicit: ExplicitParams,
    source: S,
    configured: OnceCell<DefaultsMap>,
}

impl<S: DefaultsSource> Resolver<S> {
    pub fn new(explicit: ExplicitParams, source: S) -> Self {
        Self {
            explicit,
            source,
            configured: OnceCell::new(),
        }
    }

    /// Resolve a single parameter.
    pub fn lookup(&self, param: Param) -> Result<String, ConfigError> {
        if let Some(value) = self.explicit.get(param) {
            tracing::debug!("{} = {:?} (explicit)", param.key(), value);
            return Ok(value.to_string());
        }

        if !param.is_configurable() {
            return Ok(generate_seed());
        }

        let configured = self.configured.get_or_try_init(|| self.source.load())?;
        if let Some(value) = configured.get(param.key()) {
            tracing::debug!("{} = {:?} (defaults file)", param.key(), value);
            return Ok(value.clone());
        }

        Ok(param.builtin_default().to_string())
    }

    /// Resolve every parameter into a [`ParameterSet`].
    pub fn resolve(&self) -> Result<ParameterSet, ConfigError> {
        let output = self.lookup(Param::Output)?;
        let no_unique = self.lookup(Param::NoUnique)?;

        Ok(ParameterSet {
            job_name: self.lookup(Param::JobName)?,
            partition: self.lookup(Param::Partition)?,
            account: self.lookup(Param::Account)?,
            nodes: self.lookup(Param::Nodes)?,
            ntasks: self.lookup(Param::Ntasks)?,
            cpus_per_task: self.lookup(Param::CpusPerTask)?,
            mem: self.lookup(Param::Mem)?,
            time: self.lookup(Param::Time)?,
            nodelist: self.lookup(Param::Nodelist)?,
            exclude: self.lookup(Param::Exclude)?,
            mail_user: self.lookup(Param::MailUser)?,
            mail_type: self.lookup(Param::MailType)?,
            output: Some(output).filter(|o| !o.trim().is_empty()),
            seed: self.lookup(Param::Seed)?,
            gpus: self.lookup(Param::Gpus)?,
            gpu_mem: self.lookup(Param::GpuMem)?,
            no_unique: parse_flag(Param::NoUnique, &no_unique)?,
            logs: Default::default(),
        })
    }
}

/// Integer-valued flag: zero is false, anything else true.
fn parse_flag(param: Param, value: &str) -> Result<bool, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map(|v| v != 0)
        .map_err(|_| ConfigError::InvalidFlag {
            key: param.key(),
            value: value.to_string(),
        })
}
