//! Breakpoint scorer

use super::config::{Breakpoint, CategoryConfig, ScoringConfig, Tier};
use super::extract::{extract, Extracted};
use crate::models::{AnalysisResult, CategoryScore, ScoredResult, SubScore};
use tracing::{debug, info, warn};

/// Score used when a metric has no breakpoints at all
const DEFAULT_SCORE: f64 = 5.0;

/// Score of a category with nothing measurable
pub const UNAVAILABLE: f64 = -1.0;

/// Piecewise-linear interpolation over breakpoints sorted by value.
/// Values outside the curve clamp to the nearest end.
pub fn interpolate(breakpoints: &[Breakpoint], raw: f64) -> f64 {
    let (Some(first), Some(last)) = (breakpoints.first(), breakpoints.last()) else {
        return DEFAULT_SCORE;
    };
    if raw <= first.value {
        return first.score;
    }
    if raw >= last.value {
        return last.score;
    }
    for pair in breakpoints.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if raw <= hi.value {
            let t = (raw - lo.value) / (hi.value - lo.value);
            return lo.score + t * (hi.score - lo.score);
        }
    }
    last.score
}

/// Weighted mean of the available sub-scores, [`UNAVAILABLE`] when none is
pub fn category_score(sub_scores: &[SubScore]) -> f64 {
    let (sum, weight) = sub_scores
        .iter()
        .filter(|s| s.available)
        .fold((0.0, 0.0), |(sum, weight), s| {
            (sum + s.score * s.weight, weight + s.weight)
        });
    if weight > 0.0 {
        sum / weight
    } else {
        UNAVAILABLE
    }
}

/// Weighted mean over the active categories, renormalised by their weights
pub fn composite_score(categories: &[CategoryScore]) -> Option<f64> {
    let (sum, weight) = categories
        .iter()
        .filter(|c| c.is_available())
        .fold((0.0, 0.0), |(sum, weight), c| {
            (sum + c.score * c.weight, weight + c.weight)
        });
    (weight > 0.0).then(|| sum / weight)
}

/// First tier whose minimum the score reaches; the lowest tier otherwise.
/// `tiers` must be sorted by `min_score` descending.
pub fn classify_tier(tiers: &[Tier], composite: Option<f64>) -> String {
    let reached = composite.and_then(|score| tiers.iter().find(|t| score >= t.min_score));
    reached
        .or_else(|| tiers.last())
        .map(|t| t.name.clone())
        .unwrap_or_default()
}

/// Turns analyzer output into category scores, a composite and a tier
pub struct Scorer<'a> {
    config: &'a ScoringConfig,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config }
    }

    pub fn score(&self, results: &[AnalysisResult]) -> ScoredResult {
        let mut categories = Vec::with_capacity(results.len());
        for result in results {
            let Some(config) = self.config.category(result.category) else {
                debug!("No scoring config for {}, skipping", result.category);
                continue;
            };
            categories.push(self.score_category(config, result));
        }

        let composite = composite_score(&categories);
        let tier = classify_tier(&self.config.tiers, composite);
        match composite {
            Some(score) => info!("Composite score {:.2} ({})", score, tier),
            None => warn!("No category could be scored"),
        }

        ScoredResult {
            categories,
            composite,
            tier,
        }
    }

    fn score_category(&self, config: &CategoryConfig, result: &AnalysisResult) -> CategoryScore {
        let unscored = || CategoryScore {
            category: config.category,
            name: config.category.display_name().to_string(),
            score: UNAVAILABLE,
            weight: 0.0,
            sub_scores: Vec::new(),
        };
        let Some(metrics) = &result.metrics else {
            return unscored();
        };
        let Some(extracted) = extract(metrics) else {
            debug!("{}: nothing to score", config.category);
            return unscored();
        };

        let sub_scores = score_metrics(config, extracted);
        let score = category_score(&sub_scores);
        debug!("{} scored {:.2}", config.category, score);
        CategoryScore {
            category: config.category,
            name: config.category.display_name().to_string(),
            score,
            weight: config.weight,
            sub_scores,
        }
    }
}

fn score_metrics(config: &CategoryConfig, mut extracted: Extracted) -> Vec<SubScore> {
    config
        .metrics
        .iter()
        .map(|metric| {
            let raw = extracted.values.get(metric.name.as_str()).copied();
            let available = metric.enabled
                && raw.is_some()
                && !extracted.unavailable.contains(metric.name.as_str());
            let raw_value = raw.unwrap_or(0.0);
            SubScore {
                metric: metric.name.clone(),
                raw_value,
                score: if available {
                    interpolate(&metric.breakpoints, raw_value)
                } else {
                    0.0
                },
                weight: metric.weight,
                available,
                evidence: extracted
                    .evidence
                    .remove(metric.name.as_str())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        C1Metrics, C6Metrics, Category, CategoryMetrics, FunctionMetric, MetricSummary,
    };

    fn bp(value: f64, score: f64) -> Breakpoint {
        Breakpoint { value, score }
    }

    fn sub(score: f64, weight: f64, available: bool) -> SubScore {
        SubScore {
            metric: "m".to_string(),
            raw_value: 0.0,
            score,
            weight,
            available,
            evidence: Vec::new(),
        }
    }

    fn cat(category: Category, score: f64, weight: f64) -> CategoryScore {
        CategoryScore {
            category,
            name: category.display_name().to_string(),
            score,
            weight,
            sub_scores: Vec::new(),
        }
    }

    #[test]
    fn test_interpolate_clamps_and_is_linear() {
        let curve = [bp(1.0, 10.0), bp(5.0, 8.0), bp(10.0, 5.0), bp(20.0, 1.0)];
        assert_eq!(interpolate(&curve, 0.0), 10.0);
        assert_eq!(interpolate(&curve, 1.0), 10.0);
        assert_eq!(interpolate(&curve, 5.0), 8.0);
        assert_eq!(interpolate(&curve, 100.0), 1.0);
        assert!((interpolate(&curve, 15.0) - 3.0).abs() < 1e-9);
        assert!((interpolate(&curve, 4.94) - 8.03).abs() < 1e-9);
        assert_eq!(interpolate(&[], 3.0), DEFAULT_SCORE);
    }

    #[test]
    fn test_interpolate_monotonic_between_breakpoints() {
        let curve = [bp(0.0, 1.0), bp(30.0, 3.0), bp(50.0, 6.0), bp(80.0, 8.0), bp(100.0, 10.0)];
        let mut previous = interpolate(&curve, 0.0);
        for step in 1..=100 {
            let score = interpolate(&curve, step as f64);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_category_score_skips_unavailable() {
        let subs = [sub(8.0, 0.5, true), sub(2.0, 0.5, false), sub(4.0, 0.25, true)];
        let score = category_score(&subs);
        assert!((score - (8.0 * 0.5 + 4.0 * 0.25) / 0.75).abs() < 1e-9);
        assert_eq!(category_score(&[sub(9.0, 1.0, false)]), UNAVAILABLE);
    }

    #[test]
    fn test_composite_renormalises_active_weights() {
        let categories = [
            cat(Category::C1, 8.0, 0.25),
            cat(Category::C3, UNAVAILABLE, 0.20),
            cat(Category::C6, 4.0, 0.15),
        ];
        let composite = composite_score(&categories).expect("active categories");
        assert!((composite - (8.0 * 0.25 + 4.0 * 0.15) / 0.40).abs() < 1e-9);

        assert_eq!(composite_score(&[cat(Category::C1, UNAVAILABLE, 0.25)]), None);
        assert_eq!(composite_score(&[cat(Category::C1, 7.0, 0.0)]), None);
        assert_eq!(composite_score(&[]), None);
    }

    #[test]
    fn test_classify_tier_boundaries() {
        let tiers = ScoringConfig::default().tiers;
        assert_eq!(classify_tier(&tiers, Some(8.0)), "Agent-Ready");
        assert_eq!(classify_tier(&tiers, Some(7.99)), "Agent-Assisted");
        assert_eq!(classify_tier(&tiers, Some(4.0)), "Agent-Limited");
        assert_eq!(classify_tier(&tiers, Some(0.5)), "Agent-Hostile");
        assert_eq!(classify_tier(&tiers, None), "Agent-Hostile");
    }

    #[test]
    fn test_score_end_to_end() {
        let mut config = ScoringConfig::default();
        let c1 = config.category_mut(Category::C1).expect("C1");
        c1.metrics.retain(|m| m.name == "complexity_avg");
        c1.metrics[0].breakpoints = vec![bp(1.0, 10.0), bp(5.0, 8.0), bp(10.0, 5.0), bp(20.0, 1.0)];

        let metrics = C1Metrics {
            functions: vec![FunctionMetric {
                name: "parse".to_string(),
                file: "parse.go".to_string(),
                line: 10,
                complexity: 7,
                line_count: 40,
            }],
            cyclomatic_complexity: MetricSummary {
                avg: 4.94,
                max: 7,
                max_entity: "parse".to_string(),
            },
            ..Default::default()
        };
        let results = vec![
            AnalysisResult::available(
                Category::C1,
                "C1: Code Health",
                CategoryMetrics::CodeHealth(metrics),
            ),
            AnalysisResult::unavailable(Category::C3, "C3: Architecture", "boom"),
        ];

        let scored = Scorer::new(&config).score(&results);
        let composite = scored.composite.expect("composite");
        assert!((composite - 8.03).abs() < 0.01);
        assert_eq!(scored.tier, "Agent-Ready");

        let c1 = &scored.categories[0];
        assert_eq!(c1.sub_scores.len(), 1);
        assert_eq!(c1.sub_scores[0].evidence[0].description, "parse has complexity 7");

        let c3 = &scored.categories[1];
        assert!(!c3.is_available());
        assert_eq!(c3.weight, 0.0);
    }

    #[test]
    fn test_disabled_and_missing_coverage_metrics_are_unavailable() {
        let mut config = ScoringConfig::default();
        config
            .category_mut(Category::C6)
            .and_then(|c| c.metric_mut("test_isolation"))
            .expect("metric")
            .enabled = false;

        let metrics = C6Metrics {
            coverage_percent: -1.0,
            test_isolation: 100.0,
            ..Default::default()
        };
        let results = vec![AnalysisResult::available(
            Category::C6,
            "C6: Testing",
            CategoryMetrics::Testing(metrics),
        )];
        let scored = Scorer::new(&config).score(&results);
        let subs = &scored.categories[0].sub_scores;
        let availability: Vec<(&str, bool)> =
            subs.iter().map(|s| (s.metric.as_str(), s.available)).collect();
        assert_eq!(
            availability,
            vec![
                ("test_to_code_ratio", true),
                ("coverage_percent", false),
                ("test_isolation", false),
                ("assertion_density_avg", true),
                ("test_file_ratio", true),
            ]
        );
        let composite = scored.composite.expect("composite");
        assert!((1.0..=10.0).contains(&composite));
    }
}
