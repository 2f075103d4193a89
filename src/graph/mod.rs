//! Import graph for architecture analysis
//!
//! Nodes are normalized unit identities (Go package paths, Python module
//! names, TypeScript file paths without extension). An edge A -> B exists only
//! when B resolved to a unit inside the project. The graph is rebuilt for every
//! run.

mod cycles;

pub use cycles::normalize_cycle;

use crate::models::MetricSummary;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default)]
pub struct ImportGraph {
    nodes: BTreeSet<String>,
    forward: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl ImportGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a unit that may have no edges
    pub fn add_node(&mut self, id: &str) {
        if !self.nodes.contains(id) {
            self.nodes.insert(id.to_string());
        }
    }

    /// Add `from -> to`. Self-imports are ignored, repeated edges are kept once.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.add_node(from);
        self.add_node(to);
        self.forward
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.reverse
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(String::as_str)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.forward.values().map(BTreeSet::len).sum()
    }

    /// Units imported by `id`, sorted
    pub fn imports(&self, id: &str) -> impl Iterator<Item = &str> {
        self.forward
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    /// Units importing `id`, sorted
    pub fn importers(&self, id: &str) -> impl Iterator<Item = &str> {
        self.reverse
            .get(id)
            .into_iter()
            .flat_map(|s| s.iter().map(String::as_str))
    }

    pub fn fanout(&self, id: &str) -> usize {
        self.forward.get(id).map_or(0, BTreeSet::len)
    }

    pub fn fan_in(&self, id: &str) -> usize {
        self.reverse.get(id).map_or(0, BTreeSet::len)
    }

    /// Outgoing edge counts over every node, with the busiest node
    pub fn fanout_summary(&self) -> MetricSummary {
        MetricSummary::from_values(self.nodes().map(|n| (n, self.fanout(n))))
    }

    /// Unit -> number of units importing it
    pub fn afferent_counts(&self) -> BTreeMap<String, usize> {
        self.nodes
            .iter()
            .map(|n| (n.clone(), self.fan_in(n)))
            .collect()
    }

    /// Unit -> number of units it imports
    pub fn efferent_counts(&self) -> BTreeMap<String, usize> {
        self.nodes
            .iter()
            .map(|n| (n.clone(), self.fanout(n)))
            .collect()
    }

    /// Every distinct cycle, each rotated to start at its smallest member
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        cycles::find_cycles(self)
    }
}

/// Maximum and mean of per-unit directory depths
pub fn depth_summary<I>(depths: I) -> (usize, f64)
where
    I: IntoIterator<Item = usize>,
{
    let mut max = 0;
    let mut total = 0;
    let mut count = 0;
    for depth in depths {
        max = max.max(depth);
        total += depth;
        count += 1;
    }
    let avg = if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    };
    (max, avg)
}
