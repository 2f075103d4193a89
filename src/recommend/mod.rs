//! Improvement recommendations
//!
//! Every sub-score below [`MAX_SCORE_TO_IMPROVE`] is pushed to the next
//! breakpoint that scores higher, the composite is recomputed on a copy of
//! the categories, and the metrics whose improvement moves the composite the
//! most are returned, best first.

use crate::models::{Category, CategoryScore, Effort, Recommendation, ScoredResult};
use crate::scoring::{category_score, composite_score, interpolate, Breakpoint, ScoringConfig};
use std::cmp::Ordering;
use tracing::debug;

/// Sub-scores at or above this are left alone
pub const MAX_SCORE_TO_IMPROVE: f64 = 9.0;

/// Most recommendations returned
pub const MAX_RECOMMENDATIONS: usize = 5;

const DEFAULT_IMPACT: &str = "Improving this metric enhances agent effectiveness";

/// Metrics that take more work than their score gap suggests
const HARD_METRICS: &[&str] = &["complexity_avg", "duplication_rate"];

/// Rank the most valuable improvements. `scored` is only read.
pub fn generate(scored: &ScoredResult, config: &ScoringConfig) -> Vec<Recommendation> {
    let Some(baseline) = scored.composite else {
        return Vec::new();
    };

    let mut candidates = Vec::new();
    for category in &scored.categories {
        let Some(category_config) = config.category(category.category) else {
            continue;
        };
        for sub in category.sub_scores.iter().filter(|s| s.available) {
            if sub.score >= MAX_SCORE_TO_IMPROVE {
                continue;
            }
            let Some(metric) = category_config.metric(&sub.metric) else {
                continue;
            };
            let Some(target) = next_breakpoint(&metric.breakpoints, sub.score) else {
                continue;
            };

            let simulated = simulate(
                &scored.categories,
                category.category,
                &sub.metric,
                &metric.breakpoints,
                target.value,
            );
            let delta = simulated.map_or(0.0, |s| s - baseline);
            if delta <= 0.0 {
                continue;
            }

            candidates.push(Recommendation {
                rank: 0,
                category: category.category,
                metric: sub.metric.clone(),
                current_value: sub.raw_value,
                target_value: target.value,
                current_score: sub.score,
                target_score: target.score,
                score_improvement: delta,
                effort: effort(target.score - sub.score, &sub.metric),
                summary: summary(&sub.metric, sub.raw_value, target.value),
                action: action(&sub.metric, sub.raw_value, target.value),
            });
        }
    }

    candidates.sort_by(|a, b| {
        b.score_improvement
            .partial_cmp(&a.score_improvement)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.metric.cmp(&b.metric))
    });
    candidates.truncate(MAX_RECOMMENDATIONS);
    for (i, rec) in candidates.iter_mut().enumerate() {
        rec.rank = i + 1;
    }
    debug!("{} recommendations", candidates.len());
    candidates
}

/// Among the breakpoints scoring above `current`, the one scoring lowest
fn next_breakpoint(breakpoints: &[Breakpoint], current: f64) -> Option<Breakpoint> {
    breakpoints
        .iter()
        .filter(|b| b.score > current)
        .min_by(|a, b| a.score.total_cmp(&b.score))
        .copied()
}

/// Composite after moving one metric to `raw_value`, computed on a copy
fn simulate(
    categories: &[CategoryScore],
    category: Category,
    metric: &str,
    breakpoints: &[Breakpoint],
    raw_value: f64,
) -> Option<f64> {
    let mut categories = categories.to_vec();
    if let Some(target) = categories.iter_mut().find(|c| c.category == category) {
        for sub in target.sub_scores.iter_mut().filter(|s| s.metric == metric) {
            sub.raw_value = raw_value;
            sub.score = interpolate(breakpoints, raw_value);
        }
        target.score = category_score(&target.sub_scores);
    }
    composite_score(&categories)
}

fn effort(score_gap: f64, metric: &str) -> Effort {
    let effort = if score_gap < 1.0 {
        Effort::Low
    } else if score_gap < 2.5 {
        Effort::Medium
    } else {
        Effort::High
    };
    if !HARD_METRICS.contains(&metric) {
        return effort;
    }
    match effort {
        Effort::Low => Effort::Medium,
        Effort::Medium | Effort::High => Effort::High,
    }
}

fn display_name(metric: &str) -> &str {
    match metric {
        "complexity_avg" => "average complexity",
        "func_length_avg" => "average function length",
        "file_size_avg" => "average file size",
        "duplication_rate" => "duplication rate",
        "afferent_coupling_avg" => "average afferent coupling",
        "efferent_coupling_avg" => "average efferent coupling",
        "type_annotation_coverage" => "type annotation coverage",
        "naming_consistency" => "naming consistency",
        "magic_number_ratio" => "magic number ratio",
        "type_strictness" => "type strictness",
        "null_safety" => "null safety",
        "max_dir_depth" => "max directory depth",
        "module_fanout_avg" => "average module fan-out",
        "circular_deps" => "circular dependencies",
        "import_complexity_avg" => "average import complexity",
        "dead_exports" => "dead exports",
        "readme_word_count" => "README length",
        "comment_density" => "comment density",
        "api_doc_coverage" => "API documentation coverage",
        "changelog_present" => "changelog presence",
        "examples_present" => "examples presence",
        "contributing_present" => "contributing guide presence",
        "diagrams_present" => "diagram presence",
        "test_to_code_ratio" => "test-to-code ratio",
        "coverage_percent" => "test coverage",
        "test_isolation" => "test isolation",
        "assertion_density_avg" => "average assertion density",
        "test_file_ratio" => "test file ratio",
        other => other,
    }
}

fn impact(metric: &str) -> &'static str {
    match metric {
        "complexity_avg" => "High complexity makes functions harder for agents to reason about and modify safely",
        "func_length_avg" => "Long functions exceed agent context windows, forcing partial understanding",
        "file_size_avg" => "Large files make it harder for agents to locate and navigate relevant code",
        "duplication_rate" => "Duplicated code means agents must find and update multiple locations",
        "afferent_coupling_avg" => "High incoming coupling means agent changes risk breaking many dependents",
        "efferent_coupling_avg" => "High outgoing coupling means agents must understand many dependencies",
        "type_annotation_coverage" => "Missing type annotations force agents to guess at data shapes",
        "naming_consistency" => "Inconsistent naming makes identifiers harder for agents to predict",
        "magic_number_ratio" => "Unnamed constants hide intent from agents reading the code",
        "type_strictness" => "Lenient type checking lets agent mistakes slip through unnoticed",
        "null_safety" => "Unchecked nulls lead agents into runtime failures they cannot see statically",
        "max_dir_depth" => "Deep directory nesting makes project navigation harder for agents",
        "module_fanout_avg" => "High module coupling means agent changes ripple across many packages",
        "circular_deps" => "Circular dependencies confuse agent dependency analysis",
        "import_complexity_avg" => "Complex imports make it harder for agents to understand module boundaries",
        "dead_exports" => "Dead exports clutter the API surface agents must understand",
        "readme_word_count" => "A thin README leaves agents without a map of the project",
        "comment_density" => "Sparse comments leave agents to infer intent from code alone",
        "api_doc_coverage" => "Undocumented public APIs force agents to read implementations to use them",
        "changelog_present" => "Without a changelog agents cannot tell what changed recently",
        "examples_present" => "Without examples agents have no reference usage to imitate",
        "contributing_present" => "Without contribution guidelines agents cannot follow project conventions",
        "diagrams_present" => "Without diagrams agents must reconstruct the architecture themselves",
        "test_to_code_ratio" => "Low test coverage means agents cannot verify their changes",
        "coverage_percent" => "Without test coverage data, agents cannot assess change safety",
        "test_isolation" => "Non-isolated tests create flaky failures that block agent workflows",
        "assertion_density_avg" => "Low assertion density means tests may pass despite broken behavior",
        "test_file_ratio" => "Few test files means agents lack verification for most code paths",
        _ => DEFAULT_IMPACT,
    }
}

fn summary(metric: &str, current: f64, target: f64) -> String {
    format!(
        "Improve {} from {:.1} to {:.1} -- {}",
        display_name(metric),
        current,
        target,
        impact(metric)
    )
}

fn action(metric: &str, current: f64, target: f64) -> String {
    match metric {
        "complexity_avg" => format!(
            "Refactor functions with cyclomatic complexity > {:.0} into smaller units",
            current
        ),
        "func_length_avg" => format!(
            "Break up functions longer than {:.0} lines into focused helpers",
            current
        ),
        "file_size_avg" => format!(
            "Split files larger than {:.0} lines into cohesive modules",
            current
        ),
        "duplication_rate" => format!(
            "Extract duplicated code blocks (currently {:.1}% duplication) into shared functions",
            current
        ),
        "afferent_coupling_avg" => {
            "Reduce incoming dependencies by introducing interfaces or facade patterns".to_string()
        }
        "efferent_coupling_avg" => {
            "Reduce outgoing dependencies by applying dependency inversion".to_string()
        }
        "type_annotation_coverage" => format!(
            "Annotate parameters and return types (coverage {:.0}% to {:.0}%)",
            current, target
        ),
        "naming_consistency" => format!(
            "Rename identifiers that break the language's naming convention ({:.0}% consistent)",
            current
        ),
        "magic_number_ratio" => format!(
            "Replace literal numbers with named constants ({:.1} per 1000 lines)",
            current
        ),
        "type_strictness" => {
            "Enable strict type checking (tsconfig strict, mypy or pyright)".to_string()
        }
        "null_safety" => format!(
            "Guard nullable values before use (null safety {:.0}% to {:.0}%)",
            current, target
        ),
        "max_dir_depth" => format!(
            "Flatten directory structure from depth {} to at most {}",
            current as i64, target as i64
        ),
        "module_fanout_avg" => "Reduce module fan-out by consolidating related imports".to_string(),
        "circular_deps" => "Break circular dependencies by extracting shared interfaces".to_string(),
        "import_complexity_avg" => {
            "Simplify imports by reducing average import count per file".to_string()
        }
        "dead_exports" => format!(
            "Remove {:.0} unused exported symbols to reduce API surface",
            current
        ),
        "readme_word_count" => format!(
            "Expand the README from {:.0} to at least {:.0} words",
            current, target
        ),
        "comment_density" => format!(
            "Comment non-obvious code (density {:.1}% to {:.1}%)",
            current, target
        ),
        "api_doc_coverage" => format!(
            "Document public functions and types (coverage {:.0}% to {:.0}%)",
            current, target
        ),
        "changelog_present" => "Add a CHANGELOG.md describing notable changes".to_string(),
        "examples_present" => "Add an examples/ directory or code samples to the README".to_string(),
        "contributing_present" => "Add a CONTRIBUTING.md with development conventions".to_string(),
        "diagrams_present" => "Add an architecture diagram under docs/".to_string(),
        "test_to_code_ratio" => format!(
            "Add tests to improve test-to-code ratio from {:.2} to {:.2}",
            current, target
        ),
        "coverage_percent" => format!(
            "Increase test coverage from {:.0}% to {:.0}%",
            current, target
        ),
        "test_isolation" => format!(
            "Improve test isolation from {:.0}% to {:.0}%",
            current, target
        ),
        "assertion_density_avg" => format!(
            "Add meaningful assertions (current avg: {:.1} per test)",
            current
        ),
        "test_file_ratio" => format!(
            "Add test files to cover more source files (current ratio: {:.2})",
            current
        ),
        other => format!("Improve {} from {:.1} to {:.1}", other, current, target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubScore;

    fn bp(value: f64, score: f64) -> Breakpoint {
        Breakpoint { value, score }
    }

    fn sub(metric: &str, raw: f64, score: f64, weight: f64) -> SubScore {
        SubScore {
            metric: metric.to_string(),
            raw_value: raw,
            score,
            weight,
            available: true,
            evidence: Vec::new(),
        }
    }

    fn scored(config: &ScoringConfig, categories: Vec<CategoryScore>) -> ScoredResult {
        let composite = composite_score(&categories);
        ScoredResult {
            categories,
            composite,
            tier: crate::scoring::classify_tier(&config.tiers, composite),
        }
    }

    fn category(cat: Category, weight: f64, sub_scores: Vec<SubScore>) -> CategoryScore {
        CategoryScore {
            category: cat,
            name: cat.display_name().to_string(),
            score: category_score(&sub_scores),
            weight,
            sub_scores,
        }
    }

    /// One C1 metric with a custom curve, next to a perfect C3
    fn single_metric_setup() -> (ScoringConfig, ScoredResult) {
        let mut config = ScoringConfig::default();
        let c1 = config.category_mut(Category::C1).expect("C1");
        c1.metrics.retain(|m| m.name == "complexity_avg");
        c1.metrics[0].breakpoints = vec![bp(1.0, 10.0), bp(5.0, 8.0), bp(10.0, 5.0), bp(20.0, 1.0)];

        let score = interpolate(&c1.metrics[0].breakpoints, 4.94);
        let result = scored(
            &config,
            vec![
                category(Category::C1, 0.25, vec![sub("complexity_avg", 4.94, score, 0.25)]),
                category(Category::C3, 0.20, vec![sub("max_dir_depth", 1.0, 10.0, 0.20)]),
            ],
        );
        (config, result)
    }

    #[test]
    fn test_next_breakpoint_is_smallest_step_up() {
        let curve = [bp(1.0, 10.0), bp(5.0, 8.0), bp(10.0, 5.0), bp(20.0, 1.0)];
        assert_eq!(next_breakpoint(&curve, 4.2), Some(bp(10.0, 5.0)));
        assert_eq!(next_breakpoint(&curve, 8.03), Some(bp(1.0, 10.0)));
        assert_eq!(next_breakpoint(&curve, 10.0), None);
    }

    #[test]
    fn test_end_to_end_delta_is_positive_and_bounded() {
        let (config, result) = single_metric_setup();
        let recs = generate(&result, &config);
        assert_eq!(recs.len(), 1);

        let rec = &recs[0];
        assert_eq!(rec.rank, 1);
        assert_eq!(rec.metric, "complexity_avg");
        assert_eq!(rec.target_value, 1.0);
        assert_eq!(rec.target_score, 10.0);
        assert!((rec.current_score - 8.03).abs() < 1e-9);
        assert!(rec.score_improvement > 0.0);
        // the whole score gap, scaled by C1's share of the active weight
        let bound = (rec.target_score - rec.current_score) * 0.25 / 0.45;
        assert!(rec.score_improvement <= bound + 1e-9);
        assert!((rec.score_improvement - bound).abs() < 1e-9);
        assert_eq!(rec.effort, Effort::High);
        assert!(rec
            .summary
            .starts_with("Improve average complexity from 4.9 to 1.0 -- "));
    }

    #[test]
    fn test_generation_does_not_mutate_and_is_idempotent() {
        let (config, result) = single_metric_setup();
        let before = result.clone();
        let first = generate(&result, &config);
        let second = generate(&result, &config);
        assert_eq!(result, before);
        assert_eq!(first, second);
    }

    #[test]
    fn test_ranking_caps_and_orders() {
        let config = ScoringConfig::default();
        let subs = vec![
            sub("complexity_avg", 30.0, 2.0, 0.25),
            sub("func_length_avg", 80.0, 2.0, 0.20),
            sub("file_size_avg", 600.0, 2.0, 0.15),
            sub("afferent_coupling_avg", 15.0, 2.0, 0.15),
            sub("efferent_coupling_avg", 15.0, 2.0, 0.10),
            sub("duplication_rate", 1.0, 9.5, 0.15),
        ];
        let result = scored(
            &config,
            vec![
                category(Category::C1, 0.25, subs),
                category(Category::C6, 0.15, vec![sub("test_isolation", 90.0, 9.0, 0.15)]),
            ],
        );
        let recs = generate(&result, &config);
        assert_eq!(recs.len(), MAX_RECOMMENDATIONS);
        assert!(recs
            .windows(2)
            .all(|w| w[0].score_improvement >= w[1].score_improvement));
        assert_eq!(recs[0].metric, "complexity_avg");
        assert!(recs.iter().all(|r| r.metric != "duplication_rate"));
        assert!(recs.iter().all(|r| r.metric != "test_isolation"));
        let ranks: Vec<usize> = recs.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_effort_bands_and_hard_metric_bump() {
        assert_eq!(effort(0.5, "file_size_avg"), Effort::Low);
        assert_eq!(effort(1.0, "file_size_avg"), Effort::Medium);
        assert_eq!(effort(2.5, "file_size_avg"), Effort::High);
        assert_eq!(effort(0.5, "complexity_avg"), Effort::Medium);
        assert_eq!(effort(1.5, "duplication_rate"), Effort::High);
        assert_eq!(effort(3.0, "duplication_rate"), Effort::High);
        for gap in [0.0, 0.9, 1.0, 2.4, 2.5, 9.0] {
            assert!(effort(gap, "complexity_avg") >= effort(gap, "max_dir_depth"));
        }
    }

    #[test]
    fn test_no_composite_means_no_recommendations() {
        let config = ScoringConfig::default();
        let result = ScoredResult {
            categories: Vec::new(),
            composite: None,
            tier: String::new(),
        };
        assert!(generate(&result, &config).is_empty());
    }

    #[test]
    fn test_action_templates() {
        assert_eq!(
            action("max_dir_depth", 7.0, 5.0),
            "Flatten directory structure from depth 7 to at most 5"
        );
        assert_eq!(
            action("coverage_percent", 42.0, 50.0),
            "Increase test coverage from 42% to 50%"
        );
        assert_eq!(action("churn", 1.0, 2.0), "Improve churn from 1.0 to 2.0");
        assert!(summary("churn", 1.0, 2.0).ends_with(DEFAULT_IMPACT));
    }
}
