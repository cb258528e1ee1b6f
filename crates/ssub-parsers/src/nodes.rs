//! Comma-separated node lists (`--nodelist`, `--exclude`).

use std::collections::BTreeSet;

/// A node list parsed for set comparisons.
///
/// Elements are trimmed, empty elements dropped and duplicates collapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSet {
    nodes: BTreeSet<String>,
}

impl NodeSet {
    pub fn parse(raw: &str) -> Self {
        let nodes = raw
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .collect();

        Self { nodes }
    }

    /// Number of distinct nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes present in both sets, in sorted order.
    pub fn intersection<'a>(&'a self, other: &'a NodeSet) -> Vec<&'a str> {
        self.nodes
            .intersection(&other.nodes)
            .map(String::as_str)
            .collect()
    }
}
