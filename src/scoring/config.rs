//! Default breakpoints, weights and tiers

use crate::models::Category;
use serde::{Deserialize, Serialize};

/// One point of a piecewise-linear scoring curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Breakpoint {
    pub value: f64,
    pub score: f64,
}

const fn bp(value: f64, score: f64) -> Breakpoint {
    Breakpoint { value, score }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricConfig {
    pub name: String,
    pub weight: f64,
    /// Ascending by value
    pub breakpoints: Vec<Breakpoint>,
    /// A disabled metric is scored as unavailable
    pub enabled: bool,
}

impl MetricConfig {
    fn new(name: &str, weight: f64, breakpoints: &[Breakpoint]) -> Self {
        Self {
            name: name.to_string(),
            weight,
            breakpoints: breakpoints.to_vec(),
            enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryConfig {
    pub category: Category,
    pub weight: f64,
    pub metrics: Vec<MetricConfig>,
}

impl CategoryConfig {
    pub fn metric(&self, name: &str) -> Option<&MetricConfig> {
        self.metrics.iter().find(|m| m.name == name)
    }

    pub fn metric_mut(&mut self, name: &str) -> Option<&mut MetricConfig> {
        self.metrics.iter_mut().find(|m| m.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tier {
    pub name: String,
    pub min_score: f64,
}

/// Everything the scorer and the recommendation engine need
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringConfig {
    pub categories: Vec<CategoryConfig>,
    /// Sorted by `min_score` descending
    pub tiers: Vec<Tier>,
}

impl ScoringConfig {
    pub fn category(&self, category: Category) -> Option<&CategoryConfig> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn category_mut(&mut self, category: Category) -> Option<&mut CategoryConfig> {
        self.categories.iter_mut().find(|c| c.category == category)
    }

    /// Look a metric up by name across all categories
    pub fn find_metric(&self, name: &str) -> Option<(Category, &MetricConfig)> {
        self.categories
            .iter()
            .find_map(|c| c.metric(name).map(|m| (c.category, m)))
    }

    /// Replace the tiers, keeping them sorted by `min_score` descending
    pub fn set_tiers(&mut self, mut tiers: Vec<Tier>) {
        tiers.sort_by(|a, b| b.min_score.total_cmp(&a.min_score));
        self.tiers = tiers;
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let coupling = [bp(0.0, 10.0), bp(2.0, 8.0), bp(5.0, 6.0), bp(10.0, 3.0), bp(20.0, 1.0)];
        let percent_up = [bp(0.0, 1.0), bp(30.0, 3.0), bp(50.0, 6.0), bp(80.0, 8.0), bp(100.0, 10.0)];
        let present = [bp(0.0, 3.0), bp(1.0, 10.0)];

        let categories = vec![
            CategoryConfig {
                category: Category::C1,
                weight: 0.25,
                metrics: vec![
                    MetricConfig::new(
                        "complexity_avg",
                        0.25,
                        &[bp(1.0, 10.0), bp(5.0, 8.0), bp(10.0, 6.0), bp(20.0, 3.0), bp(40.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "func_length_avg",
                        0.20,
                        &[bp(5.0, 10.0), bp(15.0, 8.0), bp(30.0, 6.0), bp(60.0, 3.0), bp(100.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "file_size_avg",
                        0.15,
                        &[bp(50.0, 10.0), bp(150.0, 8.0), bp(300.0, 6.0), bp(500.0, 3.0), bp(1000.0, 1.0)],
                    ),
                    MetricConfig::new("afferent_coupling_avg", 0.15, &coupling),
                    MetricConfig::new("efferent_coupling_avg", 0.10, &coupling),
                    MetricConfig::new(
                        "duplication_rate",
                        0.15,
                        &[bp(0.0, 10.0), bp(3.0, 8.0), bp(8.0, 6.0), bp(15.0, 3.0), bp(50.0, 1.0)],
                    ),
                ],
            },
            CategoryConfig {
                category: Category::C2,
                weight: 0.10,
                metrics: vec![
                    MetricConfig::new("type_annotation_coverage", 0.30, &percent_up),
                    MetricConfig::new(
                        "naming_consistency",
                        0.25,
                        &[bp(0.0, 1.0), bp(70.0, 3.0), bp(85.0, 6.0), bp(95.0, 8.0), bp(100.0, 10.0)],
                    ),
                    MetricConfig::new(
                        "magic_number_ratio",
                        0.20,
                        &[bp(0.0, 10.0), bp(5.0, 8.0), bp(15.0, 6.0), bp(30.0, 3.0), bp(50.0, 1.0)],
                    ),
                    MetricConfig::new("type_strictness", 0.15, &present),
                    MetricConfig::new("null_safety", 0.10, &percent_up),
                ],
            },
            CategoryConfig {
                category: Category::C3,
                weight: 0.20,
                metrics: vec![
                    MetricConfig::new(
                        "max_dir_depth",
                        0.20,
                        &[bp(1.0, 10.0), bp(3.0, 8.0), bp(5.0, 6.0), bp(7.0, 3.0), bp(10.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "module_fanout_avg",
                        0.20,
                        &[bp(0.0, 10.0), bp(3.0, 8.0), bp(6.0, 6.0), bp(10.0, 3.0), bp(15.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "circular_deps",
                        0.25,
                        &[bp(0.0, 10.0), bp(1.0, 6.0), bp(3.0, 3.0), bp(5.0, 2.0), bp(10.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "import_complexity_avg",
                        0.15,
                        &[bp(1.0, 10.0), bp(2.0, 8.0), bp(4.0, 6.0), bp(6.0, 3.0), bp(8.0, 1.0)],
                    ),
                    MetricConfig::new(
                        "dead_exports",
                        0.20,
                        &[bp(0.0, 10.0), bp(5.0, 8.0), bp(15.0, 6.0), bp(30.0, 3.0), bp(50.0, 1.0)],
                    ),
                ],
            },
            CategoryConfig {
                category: Category::C4,
                weight: 0.15,
                metrics: vec![
                    MetricConfig::new(
                        "readme_word_count",
                        0.15,
                        &[bp(0.0, 1.0), bp(100.0, 3.0), bp(300.0, 6.0), bp(500.0, 8.0), bp(1000.0, 10.0)],
                    ),
                    MetricConfig::new(
                        "comment_density",
                        0.20,
                        &[bp(0.0, 1.0), bp(5.0, 3.0), bp(10.0, 6.0), bp(15.0, 8.0), bp(25.0, 10.0)],
                    ),
                    MetricConfig::new("api_doc_coverage", 0.25, &percent_up),
                    MetricConfig::new("changelog_present", 0.10, &present),
                    MetricConfig::new("examples_present", 0.15, &present),
                    MetricConfig::new("contributing_present", 0.10, &present),
                    MetricConfig::new("diagrams_present", 0.05, &[bp(0.0, 5.0), bp(1.0, 10.0)]),
                ],
            },
            CategoryConfig {
                category: Category::C6,
                weight: 0.15,
                metrics: vec![
                    MetricConfig::new(
                        "test_to_code_ratio",
                        0.25,
                        &[bp(0.0, 1.0), bp(0.2, 4.0), bp(0.5, 6.0), bp(0.8, 8.0), bp(1.5, 10.0)],
                    ),
                    MetricConfig::new(
                        "coverage_percent",
                        0.30,
                        &[bp(0.0, 1.0), bp(30.0, 4.0), bp(50.0, 6.0), bp(70.0, 8.0), bp(90.0, 10.0)],
                    ),
                    MetricConfig::new(
                        "test_isolation",
                        0.15,
                        &[bp(0.0, 1.0), bp(40.0, 4.0), bp(60.0, 6.0), bp(80.0, 8.0), bp(95.0, 10.0)],
                    ),
                    MetricConfig::new(
                        "assertion_density_avg",
                        0.15,
                        &[bp(0.0, 1.0), bp(1.0, 4.0), bp(2.0, 6.0), bp(3.0, 8.0), bp(5.0, 10.0)],
                    ),
                    MetricConfig::new(
                        "test_file_ratio",
                        0.15,
                        &[bp(0.0, 1.0), bp(0.3, 4.0), bp(0.5, 6.0), bp(0.7, 8.0), bp(0.9, 10.0)],
                    ),
                ],
            },
        ];

        let tiers = vec![
            Tier { name: "Agent-Ready".to_string(), min_score: 8.0 },
            Tier { name: "Agent-Assisted".to_string(), min_score: 6.0 },
            Tier { name: "Agent-Limited".to_string(), min_score: 4.0 },
            Tier { name: "Agent-Hostile".to_string(), min_score: 1.0 },
        ];

        Self { categories, tiers }
    }
}
