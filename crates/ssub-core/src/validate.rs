//! Structural and cross-field checks on resolved parameters.

use crate::params::{Param, ParameterSet};
use ssub_parsers::{MemorySize, NodeSet, ParseMemoryError, non_empty};
use thiserror::Error;

/// Per-GPU memory used when GPUs are requested without one.
pub const DEFAULT_GPU_MEM: &str = "1G";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Job name '{0}' must not contain a path separator")]
    JobNameHasSeparator(String),
    #[error(transparent)]
    Memory(#[from] ParseMemoryError),
    #[error("Invalid value for {key}: '{value}' is not an integer")]
    NotInteger { key: &'static str, value: String },
    #[error("{ntasks} tasks x {cpus} CPUs per task is too many cores")]
    CoreCountOverflow { ntasks: u64, cpus: u64 },
    #[error("Node count {nodes} does not match the {listed} node(s) in the node list")]
    NodeCountMismatch { nodes: u64, listed: usize },
    #[error("Nodes both included and excluded: {}", .0.join(", "))]
    NodeConflict(Vec<String>),
    #[error("Per-GPU memory '{0}' given without a GPU count")]
    GpuMemWithoutGpus(String),
}

/// Validate resolved parameters, applying the corrective fixups.
///
/// Fixups: the node count defaults to the size of the node list, and
/// per-GPU memory defaults to [`DEFAULT_GPU_MEM`] when GPUs are requested.
pub fn validate(params: &mut ParameterSet) -> Result<(), ValidationError> {
    check_job_name(&params.job_name)?;
    MemorySize::validate(&params.mem)?;
    apply_nodelist(params)?;
    check_exclusions(params)?;
    apply_gpu_defaults(params)?;
    Ok(())
}

fn check_job_name(name: &str) -> Result<(), ValidationError> {
    if name.contains(std::path::MAIN_SEPARATOR) || name.contains('/') {
        return Err(ValidationError::JobNameHasSeparator(name.to_string()));
    }
    Ok(())
}

fn apply_nodelist(params: &mut ParameterSet) -> Result<(), ValidationError> {
    let included = NodeSet::parse(&params.nodelist);
    if included.is_empty() {
        return Ok(());
    }

    match non_empty(&params.nodes) {
        Some(count) => {
            let nodes = count
                .parse::<u64>()
                .map_err(|_| ValidationError::NotInteger {
                    key: Param::Nodes.key(),
                    value: params.nodes.clone(),
                })?;
            if nodes != included.len() as u64 {
                return Err(ValidationError::NodeCountMismatch {
                    nodes,
                    listed: included.len(),
                });
            }
        }
        None => {
            tracing::debug!("Node count set to {} from node list", included.len());
            params.nodes = included.len().to_string();
        }
    }

    Ok(())
}

fn check_exclusions(params: &ParameterSet) -> Result<(), ValidationError> {
    let included = NodeSet::parse(&params.nodelist);
    let excluded = NodeSet::parse(&params.exclude);

    let conflicts: Vec<String> = included
        .intersection(&excluded)
        .into_iter()
        .map(str::to_string)
        .collect();

    if conflicts.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::NodeConflict(conflicts))
    }
}

fn apply_gpu_defaults(params: &mut ParameterSet) -> Result<(), ValidationError> {
    let has_gpu_mem = non_empty(&params.gpu_mem).is_some();

    match (params.gpus_requested(), has_gpu_mem) {
        (false, true) => Err(ValidationError::GpuMemWithoutGpus(params.gpu_mem.clone())),
        (true, false) => {
            params.gpu_mem = DEFAULT_GPU_MEM.to_string();
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_params() -> ParameterSet {
        ParameterSet {
            job_name: "align".to_string(),
            ntasks: "1".to_string(),
            cpus_per_task: "1".to_string(),
            mail_type: "NONE".to_string(),
            seed: "abcdefghij".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_defaults_pass_unchanged() {
        let mut params = base_params();
        validate(&mut params).unwrap();
        assert_eq!(params, base_params());
    }

    #[test]
    fn test_job_name_with_separator() {
        let mut params = base_params();
        params.job_name = "runs/align".to_string();
        assert_eq!(
            validate(&mut params),
            Err(ValidationError::JobNameHasSeparator("runs/align".to_string()))
        );
    }

    #[test]
    fn test_memory_accepted_any_case() {
        for mem in ["4G", "4g", "512M", "1t", "100K", "2P", ""] {
            let mut params = base_params();
            params.mem = mem.to_string();
            assert!(validate(&mut params).is_ok(), "{mem}");
        }
    }

    #[test]
    fn test_memory_rejected() {
        for mem in ["4GB", "G", "4", "4.0G", "lots"] {
            let mut params = base_params();
            params.mem = mem.to_string();
            assert!(
                matches!(validate(&mut params), Err(ValidationError::Memory(_))),
                "{mem}"
            );
        }
    }

    #[test]
    fn test_node_count_from_nodelist() {
        let mut params = base_params();
        params.nodelist = "node01, node02,node03,node02".to_string();
        validate(&mut params).unwrap();
        assert_eq!(params.nodes, "3");
        assert_eq!(params.nodelist, "node01, node02,node03,node02");
    }

    #[test]
    fn test_node_count_must_match_nodelist() {
        let mut params = base_params();
        params.nodelist = "node01,node02".to_string();
        params.nodes = "2".to_string();
        assert!(validate(&mut params).is_ok());

        params.nodes = "3".to_string();
        assert_eq!(
            validate(&mut params),
            Err(ValidationError::NodeCountMismatch {
                nodes: 3,
                listed: 2
            })
        );
    }

    #[test]
    fn test_node_count_not_integer() {
        let mut params = base_params();
        params.nodelist = "node01".to_string();
        params.nodes = "one".to_string();
        assert!(matches!(
            validate(&mut params),
            Err(ValidationError::NotInteger { key: "nodes", .. })
        ));
    }

    #[test]
    fn test_node_count_untouched_without_nodelist() {
        let mut params = base_params();
        params.nodes = "4".to_string();
        validate(&mut params).unwrap();
        assert_eq!(params.nodes, "4");
    }

    #[test]
    fn test_nodelist_exclude_conflict_reports_all() {
        let mut params = base_params();
        params.nodelist = "n1,n2,n3".to_string();
        params.exclude = " n3 ,n4,n1,n1".to_string();
        let err = validate(&mut params).unwrap_err();
        assert_eq!(
            err,
            ValidationError::NodeConflict(vec!["n1".to_string(), "n3".to_string()])
        );
        assert_eq!(err.to_string(), "Nodes both included and excluded: n1, n3");
    }

    #[test]
    fn test_disjoint_nodelist_exclude() {
        let mut params = base_params();
        params.nodelist = "n1,n2".to_string();
        params.exclude = "n3".to_string();
        assert!(validate(&mut params).is_ok());
    }

    #[test]
    fn test_gpu_mem_without_gpus() {
        let mut params = base_params();
        params.gpu_mem = "16G".to_string();
        assert_eq!(
            validate(&mut params),
            Err(ValidationError::GpuMemWithoutGpus("16G".to_string()))
        );
    }

    #[test]
    fn test_gpu_mem_defaults() {
        let mut params = base_params();
        params.gpus = "2".to_string();
        validate(&mut params).unwrap();
        assert_eq!(params.gpu_mem, DEFAULT_GPU_MEM);

        let mut params = base_params();
        params.gpus = "1".to_string();
        params.gpu_mem = "40G".to_string();
        validate(&mut params).unwrap();
        assert_eq!(params.gpu_mem, "40G");
    }
}
