//! C3: Architecture
//!
//! Directory depth, module fanout, circular imports, import complexity and
//! unused exports. Each language builds its own [`ImportGraph`] over its
//! units (Go packages, Python modules, TypeScript files); the per-language
//! results are merged at the end.

mod go;
mod python;
mod typescript;

pub(crate) use go::build_import_graph as build_go_graph;
pub(crate) use python::build_import_graph as build_python_graph;
pub(crate) use typescript::build_import_graph as build_typescript_graph;

use super::{loc_weighted, merge_summaries, AnalysisInput, Analyzer, NativeAnalyzer};
use crate::graph::ImportGraph;
use crate::models::{C3Metrics, Category, CategoryMetrics, DeadExport, Language, MetricSummary};
use crate::parsers::GoWorkspace;
use anyhow::{bail, Result};
use tracing::debug;

pub struct ArchitectureAnalyzer;

/// Architecture findings of a single language
#[derive(Debug, Default)]
pub(crate) struct LanguageArchitecture {
    pub loc: usize,
    pub max_depth: usize,
    pub avg_depth: f64,
    pub fanout: MetricSummary,
    pub cycles: Vec<Vec<String>>,
    pub import_complexity: MetricSummary,
    pub dead_exports: Vec<DeadExport>,
}

impl LanguageArchitecture {
    fn from_graph(graph: &ImportGraph, loc: usize) -> Self {
        Self {
            loc,
            fanout: graph.fanout_summary(),
            cycles: graph.find_cycles(),
            ..Self::default()
        }
    }
}

impl ArchitectureAnalyzer {
    fn collect(
        &self,
        input: &AnalysisInput,
        workspace: Option<&GoWorkspace>,
    ) -> Result<C3Metrics> {
        let mut parts = Vec::new();
        for target in &input.targets {
            if target.source_files().next().is_none() {
                continue;
            }
            let part = match target.language() {
                Language::Go => match workspace {
                    Some(ws) => go::analyze(ws),
                    None => {
                        debug!("Go workspace not loaded, skipping Go architecture");
                        continue;
                    }
                },
                Language::Python => python::analyze(input.parsed(Language::Python)),
                Language::TypeScript => typescript::analyze(input.parsed(Language::TypeScript)),
            };
            debug!(
                "{}: {} cycles, {} dead exports",
                target.language(),
                part.cycles.len(),
                part.dead_exports.len()
            );
            parts.push(part);
        }
        if parts.is_empty() {
            bail!("no source files to analyze");
        }
        Ok(merge(parts))
    }
}

impl Analyzer for ArchitectureAnalyzer {
    fn category(&self) -> Category {
        Category::C3
    }

    fn name(&self) -> &'static str {
        "C3: Architecture"
    }

    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Architecture(self.collect(input, None)?))
    }

    fn native(&self) -> Option<&dyn NativeAnalyzer> {
        Some(self)
    }
}

impl NativeAnalyzer for ArchitectureAnalyzer {
    fn analyze_with_packages(
        &self,
        input: &AnalysisInput,
        workspace: &GoWorkspace,
    ) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Architecture(
            self.collect(input, Some(workspace))?,
        ))
    }
}

/// Depth and fanout averages are LOC-weighted, maxima are global, findings
/// are concatenated in language order.
fn merge(parts: Vec<LanguageArchitecture>) -> C3Metrics {
    let depth_parts: Vec<(f64, usize)> = parts.iter().map(|p| (p.avg_depth, p.loc)).collect();
    let fanouts: Vec<(&MetricSummary, usize)> = parts.iter().map(|p| (&p.fanout, p.loc)).collect();
    let imports: Vec<(&MetricSummary, usize)> = parts
        .iter()
        .filter(|p| !p.import_complexity.max_entity.is_empty())
        .map(|p| (&p.import_complexity, p.loc))
        .collect();

    let mut metrics = C3Metrics {
        max_directory_depth: parts.iter().map(|p| p.max_depth).max().unwrap_or(0),
        avg_directory_depth: loc_weighted(&depth_parts),
        module_fanout: merge_summaries(&fanouts),
        import_complexity: merge_summaries(&imports),
        ..C3Metrics::default()
    };
    for part in parts {
        metrics.circular_deps.extend(part.cycles);
        metrics.dead_exports.extend(part.dead_exports);
    }
    metrics
}

/// Number of `/`-separated segments, 0 for the empty path
pub(crate) fn segment_count(path: &str) -> usize {
    if path.is_empty() {
        0
    } else {
        path.split('/').count()
    }
}
