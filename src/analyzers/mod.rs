//! Analyzer dispatch
//!
//! One analyzer per metric category. Every analyzer implements [`Analyzer`];
//! the ones that can use the Go package loader's symbol tables also expose
//! [`NativeAnalyzer`] through [`Analyzer::native`]. Inside an analyzer a
//! `match` over [`Language`] picks the per-language implementation and the
//! per-language results are merged into one [`CategoryMetrics`].

pub mod architecture;
pub mod code_health;
pub mod documentation;
pub mod semantics;
pub mod testing;

use crate::models::{
    AnalysisResult, AnalysisTarget, Category, CategoryMetrics, Language, MetricSummary,
};
use crate::parsers::{GoWorkspace, ParsedSyntaxFile};
use anyhow::Result;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, warn};

/// Everything an analyzer may read. Shared by all analyzers of a run.
pub struct AnalysisInput {
    pub root: PathBuf,
    pub targets: Vec<AnalysisTarget>,
    pub parsed: BTreeMap<Language, Vec<ParsedSyntaxFile>>,
}

impl AnalysisInput {
    pub fn new(root: impl Into<PathBuf>, targets: Vec<AnalysisTarget>) -> Self {
        Self {
            root: root.into(),
            targets,
            parsed: BTreeMap::new(),
        }
    }

    pub fn with_parsed(mut self, language: Language, files: Vec<ParsedSyntaxFile>) -> Self {
        self.parsed.insert(language, files);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target(&self, language: Language) -> Option<&AnalysisTarget> {
        self.targets.iter().find(|t| t.language() == language)
    }

    /// Parsed files of a syntax-tree language (empty for Go)
    pub fn parsed(&self, language: Language) -> &[ParsedSyntaxFile] {
        self.parsed.get(&language).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Base contract every category analyzer implements
pub trait Analyzer: Send + Sync {
    fn category(&self) -> Category;

    fn name(&self) -> &'static str;

    /// Analyze using syntax trees and files only
    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics>;

    /// Richer capability for analyzers that understand the Go workspace
    fn native(&self) -> Option<&dyn NativeAnalyzer> {
        None
    }
}

/// Capability of analyzers that consume the Go package loader's output
pub trait NativeAnalyzer: Send + Sync {
    fn analyze_with_packages(
        &self,
        input: &AnalysisInput,
        workspace: &GoWorkspace,
    ) -> Result<CategoryMetrics>;
}

/// The analyzers of a standard run, in category order
pub fn default_analyzers() -> Vec<Box<dyn Analyzer>> {
    vec![
        Box::new(code_health::CodeHealthAnalyzer),
        Box::new(semantics::SemanticsAnalyzer),
        Box::new(architecture::ArchitectureAnalyzer),
        Box::new(documentation::DocumentationAnalyzer),
        Box::new(testing::TestingAnalyzer),
    ]
}

/// Run analyzers in parallel on the current rayon pool.
///
/// A failing or panicking analyzer yields an unavailable result; the others
/// always run to completion. Output order follows `analyzers`.
pub fn run_analyzers(
    analyzers: &[Box<dyn Analyzer>],
    input: &AnalysisInput,
    workspace: Option<&GoWorkspace>,
) -> Vec<AnalysisResult> {
    analyzers
        .par_iter()
        .map(|analyzer| run_single_analyzer(analyzer.as_ref(), input, workspace))
        .collect()
}

fn run_single_analyzer(
    analyzer: &dyn Analyzer,
    input: &AnalysisInput,
    workspace: Option<&GoWorkspace>,
) -> AnalysisResult {
    let name = analyzer.name();
    let start = Instant::now();
    debug!("Running analyzer: {}", name);

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        match (analyzer.native(), workspace) {
            (Some(native), Some(ws)) => native.analyze_with_packages(input, ws),
            _ => analyzer.analyze(input),
        }
    }));

    match outcome {
        Ok(Ok(metrics)) => {
            debug!(
                "Analyzer {} finished in {}ms",
                name,
                start.elapsed().as_millis()
            );
            AnalysisResult::available(analyzer.category(), name, metrics)
        }
        Ok(Err(e)) => {
            warn!("Analyzer {} failed: {:#}", name, e);
            AnalysisResult::unavailable(analyzer.category(), name, e.to_string())
        }
        Err(panic_info) => {
            let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_info.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            };
            error!("Analyzer {} panicked: {}", name, panic_msg);
            AnalysisResult::unavailable(
                analyzer.category(),
                name,
                format!("Panic: {}", panic_msg),
            )
        }
    }
}

/// LOC-weighted mean of `(value, loc)` pairs; plain mean when no lines were counted
pub fn loc_weighted(parts: &[(f64, usize)]) -> f64 {
    if parts.is_empty() {
        return 0.0;
    }
    let total: usize = parts.iter().map(|(_, loc)| loc).sum();
    if total == 0 {
        return parts.iter().map(|(v, _)| v).sum::<f64>() / parts.len() as f64;
    }
    parts
        .iter()
        .map(|(v, loc)| v * *loc as f64)
        .sum::<f64>()
        / total as f64
}

/// Merge per-language summaries: LOC-weighted average, overall maximum
pub fn merge_summaries(parts: &[(&MetricSummary, usize)]) -> MetricSummary {
    let avg_parts: Vec<(f64, usize)> = parts.iter().map(|(s, loc)| (s.avg, *loc)).collect();
    let mut merged = MetricSummary {
        avg: loc_weighted(&avg_parts),
        ..MetricSummary::default()
    };
    for (summary, _) in parts {
        if merged.max_entity.is_empty() || summary.max > merged.max {
            merged.max = summary.max;
            merged.max_entity = summary.max_entity.clone();
        }
    }
    merged
}

/// Percentage `part / whole * 100`, `default` when `whole` is zero
pub(crate) fn percent(part: usize, whole: usize, default: f64) -> f64 {
    if whole == 0 {
        default
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Occurrences per thousand lines
pub(crate) fn per_kloc(count: usize, loc: usize) -> f64 {
    if loc == 0 {
        0.0
    } else {
        count as f64 * 1000.0 / loc as f64
    }
}
