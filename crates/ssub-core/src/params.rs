//! Submission parameters.

use crate::output::LogPaths;
use crate::validate::ValidationError;

/// A recognized submission parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Param {
    JobName,
    Partition,
    Account,
    Nodes,
    Ntasks,
    CpusPerTask,
    Mem,
    Time,
    Nodelist,
    Exclude,
    MailUser,
    MailType,
    Output,
    Seed,
    Gpus,
    GpuMem,
    NoUnique,
}

impl Param {
    pub const ALL: [Param; 17] = [
        Param::JobName,
        Param::Partition,
        Param::Account,
        Param::Nodes,
        Param::Ntasks,
        Param::CpusPerTask,
        Param::Mem,
        Param::Time,
        Param::Nodelist,
        Param::Exclude,
        Param::MailUser,
        Param::MailType,
        Param::Output,
        Param::Seed,
        Param::Gpus,
        Param::GpuMem,
        Param::NoUnique,
    ];

    /// Key used in the defaults file.
    pub fn key(self) -> &'static str {
        match self {
            Self::JobName => "job_name",
            Self::Partition => "partition",
            Self::Account => "account",
            Self::Nodes => "nodes",
            Self::Ntasks => "ntasks",
            Self::CpusPerTask => "cpus_per_task",
            Self::Mem => "mem",
            Self::Time => "time",
            Self::Nodelist => "nodelist",
            Self::Exclude => "exclude",
            Self::MailUser => "mail_user",
            Self::MailType => "mail_type",
            Self::Output => "output",
            Self::Seed => "seed",
            Self::Gpus => "gpus",
            Self::GpuMem => "gpu_mem",
            Self::NoUnique => "no_unique",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.key() == key)
    }

    /// Out-of-box default used when neither the caller nor the defaults
    /// file provides a value. The seed has none; it is generated.
    pub fn builtin_default(self) -> &'static str {
        match self {
            Self::JobName => "ssub",
            Self::Ntasks => "1",
            Self::CpusPerTask => "1",
            Self::MailType => "NONE",
            Self::NoUnique => "0",
            _ => "",
        }
    }

    /// Whether the defaults file may set this parameter.
    pub fn is_configurable(self) -> bool {
        self != Self::Seed
    }
}

/// Fully resolved parameters for one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    pub job_name: String,
    pub partition: String,
    pub account: String,
    pub nodes: String,
    pub ntasks: String,
    pub cpus_per_task: String,
    pub mem: String,
    pub time: String,
    pub nodelist: String,
    pub exclude: String,
    pub mail_user: String,
    pub mail_type: String,
    /// Raw output specification, if any.
    pub output: Option<String>,
    pub seed: String,
    pub gpus: String,
    pub gpu_mem: String,
    pub no_unique: bool,
    /// Concrete log files, filled in by [`crate::derive_log_paths`].
    pub logs: LogPaths,
}

impl ParameterSet {
    pub fn gpus_requested(&self) -> bool {
        !self.gpus.trim().is_empty()
    }

    /// Cores this job will hold once running: ntasks × cpus-per-task.
    ///
    /// An empty value counts as one.
    pub fn requested_cores(&self) -> Result<u64, ValidationError> {
        let ntasks = parse_count(Param::Ntasks, &self.ntasks)?;
        let cpus = parse_count(Param::CpusPerTask, &self.cpus_per_task)?;
        ntasks
            .checked_mul(cpus)
            .ok_or(ValidationError::CoreCountOverflow { ntasks, cpus })
    }
}

fn parse_count(param: Param, value: &str) -> Result<u64, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(1);
    }
    trimmed
        .parse::<u64>()
        .map_err(|_| ValidationError::NotInteger {
            key: param.key(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_round_trip() {
        for param in Param::ALL {
            assert_eq!(Param::from_key(param.key()), Some(param));
        }
        assert_eq!(Param::from_key("bogus"), None);
    }

    #[test]
    fn test_seed_not_configurable() {
        assert!(!Param::Seed.is_configurable());
        assert!(Param::Mem.is_configurable());
    }

    #[test]
    fn test_requested_cores() {
        let params = ParameterSet {
            ntasks: "4".to_string(),
            cpus_per_task: "2".to_string(),
            ..Default::default()
        };
        assert_eq!(params.requested_cores().unwrap(), 8);

        let params = ParameterSet::default();
        assert_eq!(params.requested_cores().unwrap(), 1);
    }

    #[test]
    fn test_requested_cores_rejects_non_integer() {
        let params = ParameterSet {
            ntasks: "four".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            params.requested_cores(),
            Err(ValidationError::NotInteger { key: "ntasks", .. })
        ));
    }

    #[test]
    fn test_requested_cores_overflow() {
        let params = ParameterSet {
            ntasks: "4294967296".to_string(),
            cpus_per_task: "4294967296".to_string(),
            ..Default::default()
        };
        assert_eq!(
            params.requested_cores(),
            Err(ValidationError::CoreCountOverflow {
                ntasks: 4294967296,
                cpus: 4294967296
            })
        );
    }
}
