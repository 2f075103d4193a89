//! Line coverage from reports produced by the project's own test runs
//!
//! Looked up in the project root in this order: Go cover profile
//! (`cover.out`), LCOV (`lcov.info`, `coverage.lcov`), Cobertura XML
//! (`cobertura.xml`, `coverage.xml`).

use anyhow::{Context, Result};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub percent: f64,
    pub source: &'static str,
}

type ReportParser = fn(&str) -> Result<f64>;

const REPORTS: &[(&str, &str, ReportParser)] = &[
    ("cover.out", "go-cover", parse_go_profile),
    ("lcov.info", "lcov", parse_lcov),
    ("coverage.lcov", "lcov", parse_lcov),
    ("cobertura.xml", "cobertura", parse_cobertura),
    ("coverage.xml", "cobertura", parse_cobertura),
];

/// First coverage report found under `root`; `None` when there is none.
/// A report that exists but cannot be read or parsed is an error.
pub fn find_coverage(root: &Path) -> Result<Option<Coverage>> {
    for (name, source, parse) in REPORTS {
        let path = root.join(name);
        if !path.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let percent = parse(&content).with_context(|| format!("Invalid coverage report {}", name))?;
        debug!("Coverage {:.1}% from {}", percent, name);
        return Ok(Some(Coverage { percent, source }));
    }
    Ok(None)
}

fn profile_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(.+):(\d+)\.(\d+),(\d+)\.(\d+) (\d+) (\d+)$").expect("valid regex")
    })
}

/// Covered statements over all statements of a `go test -coverprofile` file.
/// A block listed more than once (as with `-coverpkg`) counts once, covered
/// when any of its entries is.
fn parse_go_profile(content: &str) -> Result<f64> {
    let mut lines = content.lines();
    match lines.next() {
        Some(mode) if mode.starts_with("mode:") => {}
        _ => anyhow::bail!("missing mode line"),
    }
    let mut blocks: FxHashMap<&str, (u64, u64)> = FxHashMap::default();
    for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
        let caps = profile_block()
            .captures(line)
            .with_context(|| format!("bad profile line: {}", line))?;
        let statements: u64 = caps[6].parse()?;
        let count: u64 = caps[7].parse()?;
        // file and position, without the counts
        let position = caps.get(5).map_or(line, |end| &line[..end.end()]);
        let block = blocks.entry(position).or_insert((statements, 0));
        block.1 = block.1.max(count);
    }
    let total: u64 = blocks.values().map(|(statements, _)| statements).sum();
    let covered: u64 = blocks
        .values()
        .filter(|(_, count)| *count > 0)
        .map(|(statements, _)| statements)
        .sum();
    Ok(ratio_percent(covered, total))
}

/// Hit `DA:` lines over all `DA:` lines
fn parse_lcov(content: &str) -> Result<f64> {
    let mut total = 0u64;
    let mut hit = 0u64;
    for record in content.lines().filter_map(|l| l.trim().strip_prefix("DA:")) {
        let mut fields = record.split(',');
        let (Some(_line), Some(count)) = (fields.next(), fields.next()) else {
            continue;
        };
        total += 1;
        if count.trim() != "0" {
            hit += 1;
        }
    }
    Ok(ratio_percent(hit, total))
}

fn line_rate() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<coverage\b[^>]*?\bline-rate\s*=\s*"([0-9.eE+-]+)""#).expect("valid regex")
    })
}

/// `line-rate` attribute of the root `<coverage>` element, as a percentage
fn parse_cobertura(content: &str) -> Result<f64> {
    let caps = line_rate()
        .captures(content)
        .context("no line-rate on <coverage>")?;
    let rate: f64 = caps[1].parse()?;
    Ok(rate * 100.0)
}

fn ratio_percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
