//! C6: Testing
//!
//! Test functions with their assertion counts and external dependencies,
//! test/source size ratios and line coverage from a report left in the
//! project root. Counts are totalled across languages before ratios are
//! taken.

mod coverage;
mod go;
mod python;
mod typescript;

pub use coverage::{find_coverage, Coverage};

use super::{percent, AnalysisInput, Analyzer, NativeAnalyzer};
use crate::models::{C6Metrics, Category, CategoryMetrics, Language, MetricSummary, TestFunctionMetric};
use crate::parsers::GoWorkspace;
use anyhow::Result;
use tracing::{debug, warn};

/// Isolation when there is nothing to isolate
const VACUOUS_ISOLATION: f64 = 100.0;

pub struct TestingAnalyzer;

#[derive(Debug, Default)]
pub(crate) struct LanguageTesting {
    pub test_files: usize,
    pub source_files: usize,
    pub test_loc: usize,
    pub source_loc: usize,
    pub tests: Vec<TestFunctionMetric>,
}

impl TestingAnalyzer {
    fn collect(&self, input: &AnalysisInput, workspace: Option<&GoWorkspace>) -> Result<C6Metrics> {
        let mut parts = Vec::new();
        for target in &input.targets {
            let part = match target.language() {
                Language::Go => match workspace {
                    Some(ws) => go::analyze(ws),
                    None => {
                        debug!("Go workspace not loaded, skipping Go tests");
                        continue;
                    }
                },
                Language::Python => python::analyze(input.parsed(Language::Python)),
                Language::TypeScript => typescript::analyze(input.parsed(Language::TypeScript)),
            };
            debug!(
                "{}: {} tests in {} test files",
                target.language(),
                part.tests.len(),
                part.test_files
            );
            parts.push(part);
        }

        let mut metrics = merge(parts);
        match find_coverage(input.root()) {
            Ok(Some(coverage)) => {
                metrics.coverage_percent = coverage.percent;
                metrics.coverage_source = coverage.source.to_string();
            }
            Ok(None) => {
                metrics.coverage_percent = -1.0;
                metrics.coverage_source = "none".to_string();
            }
            Err(e) => {
                warn!("Ignoring coverage: {:#}", e);
                metrics.coverage_percent = -1.0;
                metrics.coverage_source = "invalid".to_string();
            }
        }
        Ok(metrics)
    }
}

impl Analyzer for TestingAnalyzer {
    fn category(&self) -> Category {
        Category::C6
    }

    fn name(&self) -> &'static str {
        "C6: Testing"
    }

    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Testing(self.collect(input, None)?))
    }

    fn native(&self) -> Option<&dyn NativeAnalyzer> {
        Some(self)
    }
}

impl NativeAnalyzer for TestingAnalyzer {
    fn analyze_with_packages(
        &self,
        input: &AnalysisInput,
        workspace: &GoWorkspace,
    ) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Testing(
            self.collect(input, Some(workspace))?,
        ))
    }
}

fn merge(parts: Vec<LanguageTesting>) -> C6Metrics {
    let mut metrics = C6Metrics::default();
    for part in parts {
        metrics.test_file_count += part.test_files;
        metrics.source_file_count += part.source_files;
        metrics.test_loc += part.test_loc;
        metrics.source_loc += part.source_loc;
        metrics.test_functions.extend(part.tests);
    }

    if metrics.source_loc > 0 {
        metrics.test_to_code_ratio = metrics.test_loc as f64 / metrics.source_loc as f64;
    }
    let isolated = metrics
        .test_functions
        .iter()
        .filter(|t| !t.has_external_dep)
        .count();
    metrics.test_isolation = percent(isolated, metrics.test_functions.len(), VACUOUS_ISOLATION);
    metrics.assertion_density = MetricSummary::from_values(
        metrics
            .test_functions
            .iter()
            .map(|t| (t.name.as_str(), t.assertion_count)),
    );
    metrics
}
