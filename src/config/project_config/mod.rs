//! Project-level configuration support
//!
//! Loads per-project configuration from `agentready.toml` in the project
//! root, or from an explicit path given on the command line.
//!
//! # Configuration Format
//!
//! ```toml
//! # agentready.toml
//! version = 1
//! languages = ["go", "python"]
//!
//! [scoring]
//! threshold = 6.0
//!
//! [scoring.weights]
//! C1 = 0.30
//! C6 = 0.20
//!
//! [[scoring.tiers]]
//! name = "Ready"
//! min_score = 7.5
//!
//! [[scoring.tiers]]
//! name = "Not Ready"
//! min_score = 1.0
//!
//! [metrics.complexity_avg]
//! breakpoints = [{ value = 1, score = 10 }, { value = 10, score = 5 }, { value = 30, score = 1 }]
//!
//! [metrics.coverage_percent]
//! enabled = false
//! ```
//!
//! Unknown keys are rejected, as are non-finite numbers, weights or
//! thresholds below zero, category or metric names the scorer does not
//! know, breakpoints that are not strictly ascending by value and
//! breakpoint scores outside 1-10.

use crate::models::{Category, Language};
use crate::scoring::{Breakpoint, ScoringConfig, Tier};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// File looked up in the project root when no explicit path is given
pub const CONFIG_FILE_NAME: &str = "agentready.toml";

const SUPPORTED_VERSIONS: [i64; 2] = [0, 1];
const MIN_BREAKPOINT_SCORE: f64 = 1.0;
const MAX_BREAKPOINT_SCORE: f64 = 10.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unsupported config version {0} (expected 1)")]
    UnsupportedVersion(i64),

    #[error("unknown language {0:?}")]
    UnknownLanguage(String),

    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    #[error("unknown metric {0:?}")]
    UnknownMetric(String),

    #[error("weight for {name} must be >= 0, got {weight}")]
    NegativeWeight { name: String, weight: f64 },

    #[error("threshold must be >= 0, got {0}")]
    NegativeThreshold(f64),

    #[error("breakpoints for {0} must be strictly ascending by value")]
    BreakpointsNotAscending(String),

    #[error("breakpoint score {score} for {metric} is outside 1-10")]
    ScoreOutOfRange { metric: String, score: f64 },

    #[error("tier list must not be empty")]
    NoTiers,

    #[error("{name} must be a finite number, got {value}")]
    NotFinite { name: String, value: f64 },
}

/// Project configuration (from agentready.toml)
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Schema version, 0 or 1
    #[serde(default = "default_version")]
    pub version: i64,

    /// Restrict analysis to these languages
    #[serde(default)]
    pub languages: Option<Vec<String>>,

    #[serde(default)]
    pub scoring: ScoringOverrides,

    /// Per-metric overrides, keyed by metric name
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricOverride>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            languages: None,
            scoring: ScoringOverrides::default(),
            metrics: BTreeMap::new(),
        }
    }
}

fn default_version() -> i64 {
    1
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringOverrides {
    /// Composite score below which the run fails
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Category weight overrides, keyed by category id (`C1`, `C3`, ...)
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,

    /// Replaces the default tiers entirely
    #[serde(default)]
    pub tiers: Option<Vec<Tier>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricOverride {
    #[serde(default)]
    pub enabled: Option<bool>,

    #[serde(default)]
    pub breakpoints: Option<Vec<Breakpoint>>,
}

impl ProjectConfig {
    /// Parse and validate TOML content
    pub fn from_toml(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ProjectConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !SUPPORTED_VERSIONS.contains(&self.version) {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }

        for name in self.languages.iter().flatten() {
            if Language::from_name(name).is_none() {
                return Err(ConfigError::UnknownLanguage(name.clone()));
            }
        }

        if let Some(threshold) = self.scoring.threshold {
            ensure_finite("threshold", threshold)?;
            if threshold < 0.0 {
                return Err(ConfigError::NegativeThreshold(threshold));
            }
        }

        for (name, weight) in &self.scoring.weights {
            if Category::from_id(name).is_none() {
                return Err(ConfigError::UnknownCategory(name.clone()));
            }
            ensure_finite(&format!("weight for {}", name), *weight)?;
            if *weight < 0.0 {
                return Err(ConfigError::NegativeWeight {
                    name: name.clone(),
                    weight: *weight,
                });
            }
        }

        if let Some(tiers) = &self.scoring.tiers {
            if tiers.is_empty() {
                return Err(ConfigError::NoTiers);
            }
            for tier in tiers {
                ensure_finite(&format!("min_score of tier {}", tier.name), tier.min_score)?;
            }
        }

        let defaults = ScoringConfig::default();
        for (name, metric) in &self.metrics {
            if defaults.find_metric(name).is_none() {
                return Err(ConfigError::UnknownMetric(name.clone()));
            }
            if let Some(breakpoints) = &metric.breakpoints {
                validate_breakpoints(name, breakpoints)?;
            }
        }
        Ok(())
    }

    /// Languages to analyze; `None` means every supported language
    pub fn languages(&self) -> Option<Vec<Language>> {
        self.languages
            .as_ref()
            .map(|names| names.iter().filter_map(|n| Language::from_name(n)).collect())
    }

    pub fn threshold(&self) -> Option<f64> {
        self.scoring.threshold
    }

    /// Default scoring configuration with this project's overrides applied
    pub fn scoring_config(&self) -> ScoringConfig {
        let mut config = ScoringConfig::default();

        for (name, weight) in &self.scoring.weights {
            let category = Category::from_id(name).and_then(|c| config.category_mut(c));
            if let Some(category) = category {
                debug!("Weight override {} = {}", name, weight);
                category.weight = *weight;
            }
        }

        if let Some(tiers) = &self.scoring.tiers {
            config.set_tiers(tiers.clone());
        }

        for (name, overrides) in &self.metrics {
            let metric = config
                .categories
                .iter_mut()
                .find_map(|c| c.metric_mut(name));
            let Some(metric) = metric else {
                continue;
            };
            if let Some(enabled) = overrides.enabled {
                metric.enabled = enabled;
            }
            if let Some(breakpoints) = &overrides.breakpoints {
                metric.breakpoints = breakpoints.clone();
            }
        }
        config
    }
}

fn ensure_finite(name: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NotFinite {
            name: name.to_string(),
            value,
        })
    }
}

fn validate_breakpoints(metric: &str, breakpoints: &[Breakpoint]) -> Result<(), ConfigError> {
    for b in breakpoints {
        ensure_finite(&format!("breakpoint value for {}", metric), b.value)?;
    }
    if !breakpoints.windows(2).all(|w| w[0].value < w[1].value) {
        return Err(ConfigError::BreakpointsNotAscending(metric.to_string()));
    }
    let out_of_range = breakpoints
        .iter()
        .find(|b| !(MIN_BREAKPOINT_SCORE..=MAX_BREAKPOINT_SCORE).contains(&b.score));
    if let Some(b) = out_of_range {
        return Err(ConfigError::ScoreOutOfRange {
            metric: metric.to_string(),
            score: b.score,
        });
    }
    Ok(())
}

/// Load project configuration.
///
/// An explicit path must exist and be valid. Without one, `agentready.toml`
/// in `repo_path` is used when present and defaults otherwise.
pub fn load_project_config(
    repo_path: &Path,
    explicit: Option<&Path>,
) -> Result<ProjectConfig, ConfigError> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = repo_path.join(CONFIG_FILE_NAME);
            if !path.is_file() {
                debug!("No project config found, using defaults");
                return Ok(ProjectConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
        path: path.clone(),
        source,
    })?;
    let config = ProjectConfig::from_toml(&content, &path)?;
    debug!("Loaded project config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests;
