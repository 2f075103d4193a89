//! Configuration module for agentready
//!
//! This module handles:
//! - Project-level configuration (agentready.toml)
//! - Scoring customization (weights, tiers, breakpoints)
//! - Language restriction and the CI threshold

mod project_config;

pub use project_config::{
    load_project_config, ConfigError, MetricOverride, ProjectConfig, ScoringOverrides,
    CONFIG_FILE_NAME,
};
