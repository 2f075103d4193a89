//! Core data models for agentready
//!
//! Every value in here is created fresh for a single run: discovery output,
//! per-language analysis targets, per-category metrics, scores and
//! recommendations. Nothing is persisted between runs.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// Languages the analyzers understand
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Go,
    Python,
    TypeScript,
}

impl Language {
    /// All supported languages, in report order
    pub const ALL: [Language; 3] = [Language::Go, Language::Python, Language::TypeScript];

    /// Detect the language of a file from its extension
    pub fn from_path(path: &Path) -> Option<Language> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        match ext {
            "go" => Some(Language::Go),
            "py" | "pyi" => Some(Language::Python),
            "ts" | "tsx" => Some(Language::TypeScript),
            _ => None,
        }
    }

    /// Parse a language name as used in configuration files
    pub fn from_name(name: &str) -> Option<Language> {
        match name.to_ascii_lowercase().as_str() {
            "go" | "golang" => Some(Language::Go),
            "python" | "py" => Some(Language::Python),
            "typescript" | "ts" => Some(Language::TypeScript),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Go => write!(f, "go"),
            Language::Python => write!(f, "python"),
            Language::TypeScript => write!(f, "typescript"),
        }
    }
}

/// Role of a file within the project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    #[default]
    Source,
    Test,
    Generated,
    Excluded,
}

/// A file found by discovery, already classified
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub rel_path: String,
    pub language: Language,
    pub role: FileRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclude_reason: Option<String>,
}

/// A file handed to the analyzers
#[derive(Debug, Clone, Serialize)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the project root, always `/`-separated
    pub rel_path: String,
    pub language: Language,
    pub lines: usize,
    /// Raw content; left empty for Go, which the package loader reads itself
    #[serde(skip)]
    pub content: String,
    pub role: FileRole,
}

impl SourceFile {
    pub fn is_test(&self) -> bool {
        self.role == FileRole::Test
    }
}

/// All files of one language in the project
#[derive(Debug, Clone)]
pub struct AnalysisTarget {
    language: Language,
    pub root: PathBuf,
    files: Vec<SourceFile>,
}

impl AnalysisTarget {
    /// Build a target; later files repeating an earlier path are dropped.
    pub fn new(language: Language, root: impl Into<PathBuf>, files: Vec<SourceFile>) -> Self {
        let mut seen = HashSet::new();
        let files = files
            .into_iter()
            .filter(|f| seen.insert(f.rel_path.clone()))
            .collect();
        Self {
            language,
            root: root.into(),
            files,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    pub fn source_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.role == FileRole::Source)
    }

    pub fn test_files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.iter().filter(|f| f.role == FileRole::Test)
    }

    /// Lines of code across source (non-test) files
    pub fn source_lines(&self) -> usize {
        self.source_files().map(|f| f.lines).sum()
    }

    /// Lines of code across every file in the target
    pub fn total_lines(&self) -> usize {
        self.files.iter().map(|f| f.lines).sum()
    }
}

/// Metric categories
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Category {
    C1,
    C2,
    C3,
    C4,
    C6,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::C1,
        Category::C2,
        Category::C3,
        Category::C4,
        Category::C6,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Category::C1 => "C1",
            Category::C2 => "C2",
            Category::C3 => "C3",
            Category::C4 => "C4",
            Category::C6 => "C6",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Category::C1 => "Code Health",
            Category::C2 => "Semantic Explicitness",
            Category::C3 => "Architecture",
            Category::C4 => "Documentation Quality",
            Category::C6 => "Testing",
        }
    }

    pub fn from_id(id: &str) -> Option<Category> {
        Category::ALL
            .into_iter()
            .find(|c| c.id().eq_ignore_ascii_case(id))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Average / maximum pair every summarised sub-metric reduces to
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricSummary {
    pub avg: f64,
    pub max: usize,
    pub max_entity: String,
}

impl MetricSummary {
    /// Summarise `(entity, value)` pairs. The first entity reaching the maximum wins.
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, usize)>,
    {
        let mut summary = MetricSummary::default();
        let mut total = 0usize;
        let mut count = 0usize;
        for (entity, value) in values {
            total += value;
            count += 1;
            if count == 1 || value > summary.max {
                summary.max = value;
                summary.max_entity = entity.to_string();
            }
        }
        if count > 0 {
            summary.avg = total as f64 / count as f64;
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionMetric {
    pub name: String,
    pub file: String,
    pub line: usize,
    pub complexity: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateBlock {
    pub file_a: String,
    pub start_a: usize,
    pub end_a: usize,
    pub file_b: String,
    pub start_b: usize,
    pub end_b: usize,
    pub line_count: usize,
}

/// C1: code health
#[derive(Debug, Clone, Default, Serialize)]
pub struct C1Metrics {
    pub functions: Vec<FunctionMetric>,
    pub cyclomatic_complexity: MetricSummary,
    pub function_length: MetricSummary,
    pub file_size: MetricSummary,
    /// Unit -> number of units importing it
    pub afferent_coupling: BTreeMap<String, usize>,
    /// Unit -> number of units it imports
    pub efferent_coupling: BTreeMap<String, usize>,
    pub afferent_coupling_avg: f64,
    pub efferent_coupling_avg: f64,
    pub duplication_rate: f64,
    pub duplicated_blocks: Vec<DuplicateBlock>,
}

/// Per-language C2 measurements
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct C2LanguageMetrics {
    pub type_annotation_coverage: f64,
    pub naming_consistency: f64,
    pub magic_number_count: usize,
    /// Magic numbers per thousand lines
    pub magic_number_ratio: f64,
    /// 1.0 when the language's strict type checking is configured
    pub type_strictness: f64,
    pub null_safety: f64,
    pub total_functions: usize,
    pub total_identifiers: usize,
    pub loc: usize,
}

/// C2: semantic explicitness
#[derive(Debug, Clone, Default, Serialize)]
pub struct C2Metrics {
    pub per_language: BTreeMap<Language, C2LanguageMetrics>,
    pub aggregate: Option<C2LanguageMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadExport {
    /// Declaring unit (package path or module identity)
    pub package: String,
    pub name: String,
    pub file: String,
    pub line: usize,
    pub kind: String,
}

/// C3: architecture
#[derive(Debug, Clone, Default, Serialize)]
pub struct C3Metrics {
    pub max_directory_depth: usize,
    pub avg_directory_depth: f64,
    pub module_fanout: MetricSummary,
    pub circular_deps: Vec<Vec<String>>,
    pub import_complexity: MetricSummary,
    pub dead_exports: Vec<DeadExport>,
}

/// C4: documentation quality
#[derive(Debug, Clone, Default, Serialize)]
pub struct C4Metrics {
    pub readme_present: bool,
    pub readme_word_count: usize,
    pub comment_density: f64,
    pub api_doc_coverage: f64,
    pub changelog_present: bool,
    pub examples_present: bool,
    pub contributing_present: bool,
    pub diagrams_present: bool,
    pub total_source_lines: usize,
    pub comment_lines: usize,
    pub public_apis: usize,
    pub documented_apis: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestFunctionMetric {
    pub name: String,
    pub file: String,
    pub line: usize,
    pub assertion_count: usize,
    pub has_external_dep: bool,
}

/// C6: testing
#[derive(Debug, Clone, Default, Serialize)]
pub struct C6Metrics {
    pub test_file_count: usize,
    pub source_file_count: usize,
    pub test_loc: usize,
    pub source_loc: usize,
    pub test_to_code_ratio: f64,
    /// Line coverage percentage, -1 when no report was found
    pub coverage_percent: f64,
    pub coverage_source: String,
    pub test_isolation: f64,
    pub assertion_density: MetricSummary,
    pub test_functions: Vec<TestFunctionMetric>,
}

/// Metrics of one category, merged across languages
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CategoryMetrics {
    CodeHealth(C1Metrics),
    Semantics(C2Metrics),
    Architecture(C3Metrics),
    Documentation(C4Metrics),
    Testing(C6Metrics),
}

/// Output of one analyzer
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub category: Category,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<CategoryMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
}

impl AnalysisResult {
    pub fn available(category: Category, name: &str, metrics: CategoryMetrics) -> Self {
        Self {
            category,
            name: name.to_string(),
            metrics: Some(metrics),
            unavailable_reason: None,
        }
    }

    pub fn unavailable(category: Category, name: &str, reason: impl Into<String>) -> Self {
        Self {
            category,
            name: name.to_string(),
            metrics: None,
            unavailable_reason: Some(reason.into()),
        }
    }
}

/// A concrete offender backing a sub-score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvidenceItem {
    pub file_path: String,
    pub line: usize,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubScore {
    pub metric: String,
    pub raw_value: f64,
    pub score: f64,
    pub weight: f64,
    pub available: bool,
    pub evidence: Vec<EvidenceItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryScore {
    pub category: Category,
    pub name: String,
    /// Weighted sub-score mean, negative when nothing was measurable
    pub score: f64,
    pub weight: f64,
    pub sub_scores: Vec<SubScore>,
}

impl CategoryScore {
    pub fn is_available(&self) -> bool {
        self.score >= 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredResult {
    pub categories: Vec<CategoryScore>,
    pub composite: Option<f64>,
    pub tier: String,
}

/// Effort tiers, ordered from least to most work
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Effort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Effort::Low => write!(f, "Low"),
            Effort::Medium => write!(f, "Medium"),
            Effort::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub rank: usize,
    pub category: Category,
    pub metric: String,
    pub current_value: f64,
    pub target_value: f64,
    pub current_score: f64,
    pub target_score: f64,
    pub score_improvement: f64,
    pub effort: Effort,
    pub summary: String,
    pub action: String,
}
