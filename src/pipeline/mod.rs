//! Scan pipeline
//!
//! Orchestrates a full run:
//! 1. Discover and classify project files
//! 2. Build one analysis target per language
//! 3. Parse (syntax trees for Python/TypeScript, package loader for Go)
//! 4. Run the category analyzers on a dedicated thread pool
//! 5. Score the results
//! 6. Derive improvement recommendations

mod targets;

pub use targets::build_targets;

use crate::analyzers::{default_analyzers, run_analyzers, AnalysisInput};
use crate::config::ProjectConfig;
use crate::discovery::discover;
use crate::models::{
    AnalysisResult, FileRole, Language, Recommendation, ScoredResult,
};
use crate::parsers::{GoLoader, SyntaxParser};
use crate::recommend;
use crate::scoring::{Scorer, ScoringConfig};
use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

/// File counts from discovery
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileCounts {
    pub source: usize,
    pub test: usize,
    pub generated: usize,
    pub excluded: usize,
}

/// Everything a run produces
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub languages: Vec<Language>,
    pub files: FileCounts,
    pub results: Vec<AnalysisResult>,
    pub scored: ScoredResult,
    pub recommendations: Vec<Recommendation>,
}

/// Full scan pipeline
pub struct Pipeline {
    scoring: ScoringConfig,
    languages: Option<Vec<Language>>,
    workers: usize,
    recommendations: bool,
}

impl Pipeline {
    pub fn new(config: &ProjectConfig) -> Self {
        Self {
            scoring: config.scoring_config(),
            languages: config.languages(),
            workers: default_workers(),
            recommendations: true,
        }
    }

    /// Number of analyzer threads
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn without_recommendations(mut self) -> Self {
        self.recommendations = false;
        self
    }

    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    pub fn run(&self, root: &Path) -> Result<ScanReport> {
        let start = Instant::now();
        let root = root
            .canonicalize()
            .with_context(|| format!("Cannot resolve {}", root.display()))?;

        let discovery = discover(&root, self.languages.as_deref())?;
        let files = FileCounts {
            source: discovery.count(FileRole::Source),
            test: discovery.count(FileRole::Test),
            generated: discovery.count(FileRole::Generated),
            excluded: discovery.count(FileRole::Excluded),
        };
        let targets = build_targets(&root, &discovery.files);
        let languages: Vec<Language> = targets.iter().map(|t| t.language()).collect();
        if targets.is_empty() {
            bail!("No Go, Python or TypeScript source files found in {}", root.display());
        }

        let parser = SyntaxParser::new().context("Failed to initialize parsers")?;
        let mut workspace = None;
        let mut input = AnalysisInput::new(&root, Vec::new());
        for target in &targets {
            match target.language() {
                Language::Go => {
                    let mut loader = GoLoader::new().context("Failed to initialize Go loader")?;
                    let ws = loader.load(target);
                    debug!("Loaded {} Go packages", ws.packages.len());
                    workspace = Some(ws);
                }
                Language::Python | Language::TypeScript => {
                    input = input.with_parsed(target.language(), parser.parse_target(target));
                }
            }
        }
        parser.close();
        input.targets = targets;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()?;
        let analyzers = default_analyzers();
        let results = pool.install(|| run_analyzers(&analyzers, &input, workspace.as_ref()));

        let scored = Scorer::new(&self.scoring).score(&results);
        let recommendations = if self.recommendations {
            recommend::generate(&scored, &self.scoring)
        } else {
            Vec::new()
        };

        info!(
            "Scanned {} in {}ms",
            root.display(),
            start.elapsed().as_millis()
        );
        Ok(ScanReport {
            root,
            languages,
            files,
            results,
            scored,
            recommendations,
        })
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(8)
}
