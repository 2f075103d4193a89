//! Command-line interface

use crate::config::load_project_config;
use crate::pipeline::{Pipeline, ScanReport};
use crate::reporters::{self, OutputFormat};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use tracing::debug;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Parse and validate a score threshold (>= 0)
fn parse_threshold(s: &str) -> Result<f64, String> {
    let n: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if !n.is_finite() || n < 0.0 {
        Err("threshold must be a finite number >= 0".to_string())
    } else {
        Ok(n)
    }
}

/// Agentready - how well does this codebase suit AI coding agents?
#[derive(Parser, Debug)]
#[command(name = "agentready")]
#[command(
    version,
    about = "Score Go, Python and TypeScript codebases on how well they support AI coding agents",
    long_about = "Agentready measures code health, semantic explicitness, architecture, \
documentation and testing, interpolates each metric onto a 1-10 scale and combines them \
into a weighted composite with a readiness tier.\n\n\
Scoring can be tuned per project with an agentready.toml file in the project root.",
    after_help = "\
Examples:
  agentready                         Scan the current directory
  agentready ./service --format json JSON output for scripting
  agentready . --threshold 6         Exit code 1 if the composite is below 6 (CI mode)
  agentready . --config ci.toml      Use an explicit config file"
)]
pub struct Cli {
    /// Path to the project (default: current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file (default: agentready.toml in the project root)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Output format: text, json
    #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
    pub format: String,

    /// Fail (exit code 1) when the composite score is below this value
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,

    /// Number of parallel workers (1-64)
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Skip improvement recommendations
    #[arg(long)]
    pub no_recommendations: bool,
}

/// Run a scan and print the report
pub fn run(cli: Cli) -> Result<()> {
    let config = load_project_config(&cli.path, cli.config.as_deref())?;
    let format: OutputFormat = cli.format.parse()?;

    let mut pipeline = Pipeline::new(&config);
    if let Some(workers) = cli.workers {
        pipeline = pipeline.with_workers(workers);
    }
    if cli.no_recommendations {
        pipeline = pipeline.without_recommendations();
    }

    let report = pipeline
        .run(&cli.path)
        .with_context(|| format!("Failed to scan {}", cli.path.display()))?;
    println!("{}", reporters::render(&report, format)?);

    let threshold = cli.threshold.or(config.threshold());
    check_threshold(&report, threshold);
    Ok(())
}

/// Exit with code 1 when the composite is below the threshold
fn check_threshold(report: &ScanReport, threshold: Option<f64>) {
    let Some(threshold) = threshold else {
        return;
    };
    if below_threshold(report, threshold) {
        match report.scored.composite {
            Some(score) => eprintln!(
                "{} composite {:.1} is below threshold {:.1}",
                style("FAIL").red().bold(),
                score,
                threshold
            ),
            None => eprintln!(
                "{} no composite score to compare against threshold {:.1}",
                style("FAIL").red().bold(),
                threshold
            ),
        }
        std::process::exit(1);
    }
    debug!("Composite meets threshold {}", threshold);
}

/// A missing composite never passes a threshold
pub fn below_threshold(report: &ScanReport, threshold: f64) -> bool {
    report.scored.composite.map_or(true, |score| score < threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporters::tests::test_report;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "agentready",
            "repo",
            "--format",
            "json",
            "--threshold",
            "6.5",
            "--workers",
            "4",
            "--no-recommendations",
        ])
        .expect("valid flags");
        assert_eq!(cli.path, PathBuf::from("repo"));
        assert_eq!(cli.format, "json");
        assert_eq!(cli.threshold, Some(6.5));
        assert_eq!(cli.workers, Some(4));
        assert!(cli.no_recommendations);
        assert_eq!(cli.log_level, "warn");
    }

    #[test]
    fn test_invalid_flags_are_rejected() {
        for args in [
            vec!["agentready", "--workers", "0"],
            vec!["agentready", "--workers", "65"],
            vec!["agentready", "--threshold", "-1"],
            vec!["agentready", "--threshold", "inf"],
            vec!["agentready", "--threshold", "NaN"],
            vec!["agentready", "--format", "sarif"],
        ] {
            assert!(Cli::try_parse_from(args.clone()).is_err(), "{:?}", args);
        }
    }

    #[test]
    fn test_below_threshold() {
        let mut report = test_report();
        assert!(!below_threshold(&report, 6.0));
        assert!(below_threshold(&report, 6.5));

        report.scored.composite = None;
        assert!(below_threshold(&report, 0.0));
    }
}
