//! C2: Semantic Explicitness
//!
//! How much meaning a reader (or an agent) gets from the code itself: type
//! annotations, naming conventions, unexplained numeric literals, strict type
//! checking and null safety.

mod go;
mod python;
mod typescript;

use super::{loc_weighted, AnalysisInput, Analyzer, NativeAnalyzer};
use crate::models::{C2LanguageMetrics, C2Metrics, Category, CategoryMetrics, Language};
use crate::parsers::GoWorkspace;
use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

pub struct SemanticsAnalyzer;

impl SemanticsAnalyzer {
    fn collect(&self, input: &AnalysisInput, workspace: Option<&GoWorkspace>) -> C2Metrics {
        let mut per_language = BTreeMap::new();
        for target in &input.targets {
            if target.source_files().next().is_none() {
                continue;
            }
            let metrics = match target.language() {
                Language::Go => match workspace {
                    Some(ws) => go::analyze(ws),
                    None => {
                        debug!("Go workspace not loaded, skipping Go semantics");
                        continue;
                    }
                },
                Language::Python => python::analyze(input.parsed(Language::Python), input.root()),
                Language::TypeScript => {
                    typescript::analyze(input.parsed(Language::TypeScript), input.root())
                }
            };
            per_language.insert(target.language(), metrics);
        }
        let aggregate = aggregate(&per_language);
        C2Metrics {
            per_language,
            aggregate,
        }
    }
}

impl Analyzer for SemanticsAnalyzer {
    fn category(&self) -> Category {
        Category::C2
    }

    fn name(&self) -> &'static str {
        "C2: Semantic Explicitness"
    }

    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Semantics(self.collect(input, None)))
    }

    fn native(&self) -> Option<&dyn NativeAnalyzer> {
        Some(self)
    }
}

impl NativeAnalyzer for SemanticsAnalyzer {
    fn analyze_with_packages(
        &self,
        input: &AnalysisInput,
        workspace: &GoWorkspace,
    ) -> Result<CategoryMetrics> {
        Ok(CategoryMetrics::Semantics(
            self.collect(input, Some(workspace)),
        ))
    }
}

/// LOC-weighted blend of the per-language values; counts are summed
fn aggregate(per_language: &BTreeMap<Language, C2LanguageMetrics>) -> Option<C2LanguageMetrics> {
    if per_language.is_empty() {
        return None;
    }
    let weighted = |value: fn(&C2LanguageMetrics) -> f64| -> f64 {
        let parts: Vec<(f64, usize)> = per_language
            .values()
            .map(|m| (value(m), m.loc))
            .collect();
        loc_weighted(&parts)
    };
    Some(C2LanguageMetrics {
        type_annotation_coverage: weighted(|m| m.type_annotation_coverage),
        naming_consistency: weighted(|m| m.naming_consistency),
        magic_number_ratio: weighted(|m| m.magic_number_ratio),
        type_strictness: weighted(|m| m.type_strictness),
        null_safety: weighted(|m| m.null_safety),
        magic_number_count: per_language.values().map(|m| m.magic_number_count).sum(),
        total_functions: per_language.values().map(|m| m.total_functions).sum(),
        total_identifiers: per_language.values().map(|m| m.total_identifiers).sum(),
        loc: per_language.values().map(|m| m.loc).sum(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{parse_files, target_of};

    #[test]
    fn test_aggregate_is_loc_weighted() {
        let mut per_language = BTreeMap::new();
        per_language.insert(
            Language::Go,
            C2LanguageMetrics {
                type_annotation_coverage: 100.0,
                type_strictness: 1.0,
                magic_number_count: 3,
                loc: 300,
                ..Default::default()
            },
        );
        per_language.insert(
            Language::Python,
            C2LanguageMetrics {
                type_annotation_coverage: 20.0,
                magic_number_count: 1,
                loc: 100,
                ..Default::default()
            },
        );
        let agg = aggregate(&per_language).expect("aggregate");
        assert!((agg.type_annotation_coverage - 80.0).abs() < 1e-9);
        assert!((agg.type_strictness - 0.75).abs() < 1e-9);
        assert_eq!(agg.magic_number_count, 4);
        assert_eq!(agg.loc, 400);
    }

    #[test]
    fn test_no_languages_means_no_aggregate() {
        assert!(aggregate(&BTreeMap::new()).is_none());
    }

    #[test]
    fn test_analyzer_keeps_per_language_results() {
        let files = [("app/core.py", "def run(x: int) -> int:\n    return x\n")];
        let input = AnalysisInput::new("/repo", vec![target_of(Language::Python, &files)])
            .with_parsed(Language::Python, parse_files(Language::Python, &files));
        let CategoryMetrics::Semantics(metrics) =
            SemanticsAnalyzer.analyze(&input).expect("analyze")
        else {
            panic!("wrong metrics variant");
        };
        let python = &metrics.per_language[&Language::Python];
        assert_eq!(python.type_annotation_coverage, 100.0);
        assert_eq!(metrics.aggregate.as_ref(), Some(python));
    }
}
