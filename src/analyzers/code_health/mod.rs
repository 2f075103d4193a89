//! C1: Code Health
//!
//! Per function: cyclomatic complexity and length. Per file: size. Per
//! language: structural duplication and afferent/efferent coupling taken from
//! the architecture import graphs.

mod duplication;
mod go;
mod python;
mod typescript;

use super::{loc_weighted, merge_summaries, AnalysisInput, Analyzer, NativeAnalyzer};
use crate::graph::ImportGraph;
use crate::models::{
    C1Metrics, Category, CategoryMetrics, DuplicateBlock, FunctionMetric, Language, MetricSummary,
};
use crate::parsers::{node_text, walk_tree, GoWorkspace};
use anyhow::{bail, Result};
use std::collections::BTreeMap;
use tracing::debug;
use tree_sitter::Node;

pub struct CodeHealthAnalyzer;

#[derive(Debug, Default)]
pub(crate) struct LanguageHealth {
    pub loc: usize,
    pub functions: Vec<FunctionMetric>,
    pub file_size: MetricSummary,
    pub duplicates: Vec<DuplicateBlock>,
    pub duplication_rate: f64,
    pub afferent: BTreeMap<String, usize>,
    pub efferent: BTreeMap<String, usize>,
}

impl LanguageHealth {
    fn set_coupling(&mut self, graph: &ImportGraph) {
        self.afferent = graph.afferent_counts();
        self.efferent = graph.efferent_counts();
    }

    fn complexity(&self) -> MetricSummary {
        MetricSummary::from_values(self.functions.iter().map(|f| (f.name.as_str(), f.complexity)))
    }

    fn length(&self) -> MetricSummary {
        MetricSummary::from_values(self.functions.iter().map(|f| (f.name.as_str(), f.line_count)))
    }
}

impl CodeHealthAnalyzer {
    fn collect(
        &self,
        input: &AnalysisInput,
        workspace: Option<&GoWorkspace>,
    ) -> Result<C1Metrics> {
        let mut parts = Vec::new();
        for target in &input.targets {
            if target.source_files().next().is_none() {
                continue;
            }
            let part = match target.language() {
                Language::Go => match workspace {
                    Some(ws) => go::analyze(ws),
                    None => {
                        debug!("Go workspace not loaded, skipping Go code health");
                        continue;
                    }
                },
                Language::Python => python::analyze(input.parsed(Language::Python)),
                Language::TypeScript => typescript::analyze(input.parsed(Language::TypeScript)),
            };
            debug!(
                "{}: {} functions, {} duplicate pairs",
                target.language(),
                part.functions.len(),
                part.duplicates.len()
            );
            parts.push(part);
        }
        if parts.is_empty() {
            bail!("no source files to analyze");
        }
        Ok(merge(parts))
    }
}

impl Analyzer for CodeHealthAnalyzer {
    fn category(&self) -> Category {
        Category::C1
    }

    fn name(&self) -> &'static str {
        "C1: Code Health"
    }

    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::CodeHealth(self.collect(input, None)?))
    }

    fn native(&self) -> Option<&dyn NativeAnalyzer> {
        Some(self)
    }
}

impl NativeAnalyzer for CodeHealthAnalyzer {
    fn analyze_with_packages(
        &self,
        input: &AnalysisInput,
        workspace: &GoWorkspace,
    ) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::CodeHealth(
            self.collect(input, Some(workspace))?,
        ))
    }
}

fn mean_count(counts: &BTreeMap<String, usize>) -> f64 {
    if counts.is_empty() {
        0.0
    } else {
        counts.values().sum::<usize>() as f64 / counts.len() as f64
    }
}

fn merge(parts: Vec<LanguageHealth>) -> C1Metrics {
    let complexity: Vec<MetricSummary> = parts.iter().map(LanguageHealth::complexity).collect();
    let length: Vec<MetricSummary> = parts.iter().map(LanguageHealth::length).collect();
    let with_loc = |summaries: &[MetricSummary]| -> MetricSummary {
        let weighted: Vec<(&MetricSummary, usize)> = summaries
            .iter()
            .zip(&parts)
            .filter(|(s, _)| !s.max_entity.is_empty())
            .map(|(s, p)| (s, p.loc))
            .collect();
        merge_summaries(&weighted)
    };
    let file_sizes: Vec<MetricSummary> = parts.iter().map(|p| p.file_size.clone()).collect();

    let mut metrics = C1Metrics {
        cyclomatic_complexity: with_loc(&complexity),
        function_length: with_loc(&length),
        file_size: with_loc(&file_sizes),
        duplication_rate: loc_weighted(
            &parts
                .iter()
                .map(|p| (p.duplication_rate, p.loc))
                .collect::<Vec<_>>(),
        ),
        afferent_coupling_avg: loc_weighted(
            &parts
                .iter()
                .map(|p| (mean_count(&p.afferent), p.loc))
                .collect::<Vec<_>>(),
        ),
        efferent_coupling_avg: loc_weighted(
            &parts
                .iter()
                .map(|p| (mean_count(&p.efferent), p.loc))
                .collect::<Vec<_>>(),
        ),
        ..C1Metrics::default()
    };
    for part in parts {
        metrics.functions.extend(part.functions);
        metrics.duplicated_blocks.extend(part.duplicates);
        metrics.afferent_coupling.extend(part.afferent);
        metrics.efferent_coupling.extend(part.efferent);
    }
    metrics
}

/// 1 plus every decision point under `root`. Subtrees for which `is_boundary`
/// holds (nested functions or classes) are not entered.
pub(crate) fn cyclomatic<'t, D, B>(root: Node<'t>, is_decision: D, is_boundary: B) -> usize
where
    D: Fn(Node<'t>) -> bool,
    B: Fn(Node<'t>) -> bool,
{
    let mut complexity = 1;
    walk_tree(root, |node| {
        if node.id() != root.id() && is_boundary(node) {
            return false;
        }
        if is_decision(node) {
            complexity += 1;
        }
        true
    });
    complexity
}

/// Operator text of a binary expression
fn binary_operator<'s>(node: Node<'_>, source: &'s [u8]) -> &'s str {
    node.child_by_field_name("operator")
        .map(|op| node_text(op, source))
        .unwrap_or("")
}
