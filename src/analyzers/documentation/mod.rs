//! C4: Documentation Quality
//!
//! Project-level documents (README, changelog, contributing guide, examples,
//! diagrams) are looked up from the project root. Comment density and API
//! documentation coverage come from the source files of every language.

mod sources;

use super::{percent, AnalysisInput, Analyzer};
use crate::models::{C4Metrics, Category, CategoryMetrics, Language};
use anyhow::Result;
use ignore::WalkBuilder;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

const README_NAMES: &[&str] = &["README.md", "README", "readme.md", "Readme.md", "README.txt"];
const CHANGELOG_NAMES: &[&str] = &[
    "CHANGELOG.md",
    "CHANGELOG",
    "changelog.md",
    "Changelog.md",
    "HISTORY.md",
    "CHANGES.md",
];
const CONTRIBUTING_NAMES: &[&str] = &[
    "CONTRIBUTING.md",
    "CONTRIBUTING",
    "contributing.md",
    ".github/CONTRIBUTING.md",
];
const EXAMPLE_DIRS: &[&str] = &["examples", "example", "_examples"];
const DIAGRAM_EXTENSIONS: &[&str] = &["png", "svg", "mermaid", "drawio", "puml"];
const DIAGRAM_KEYWORDS: &[&str] = &[
    "architecture",
    "diagram",
    "flow",
    "sequence",
    "class",
    "er",
    "uml",
];
const MIN_README_CODE_FENCES: usize = 2;

pub struct DocumentationAnalyzer;

/// Comment and API documentation counts of one language
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub(crate) struct SourceDocs {
    pub total_lines: usize,
    pub comment_lines: usize,
    pub public_apis: usize,
    pub documented_apis: usize,
}

impl SourceDocs {
    fn add(&mut self, other: SourceDocs) {
        self.total_lines += other.total_lines;
        self.comment_lines += other.comment_lines;
        self.public_apis += other.public_apis;
        self.documented_apis += other.documented_apis;
    }
}

impl Analyzer for DocumentationAnalyzer {
    fn category(&self) -> Category {
        Category::C4
    }

    fn name(&self) -> &'static str {
        "C4: Documentation Quality"
    }

    fn analyze(&self, input: &AnalysisInput) -> Result<CategoryMetrics> {
        let root = input.root();
        let (readme_present, readme_word_count) = readme(root);

        let mut docs = SourceDocs::default();
        for target in &input.targets {
            let part = match target.language() {
                Language::Go => sources::go_docs(target.source_files()),
                Language::Python => sources::python_docs(input.parsed(Language::Python)),
                Language::TypeScript => sources::typescript_docs(input.parsed(Language::TypeScript)),
            };
            debug!("{} documentation: {:?}", target.language(), part);
            docs.add(part);
        }

        Ok(CategoryMetrics::Documentation(C4Metrics {
            readme_present,
            readme_word_count,
            comment_density: percent(docs.comment_lines, docs.total_lines, 0.0),
            api_doc_coverage: percent(docs.documented_apis, docs.public_apis, 0.0),
            changelog_present: any_exists(root, CHANGELOG_NAMES),
            examples_present: has_examples(root),
            contributing_present: any_exists(root, CONTRIBUTING_NAMES),
            diagrams_present: has_diagrams(root),
            total_source_lines: docs.total_lines,
            comment_lines: docs.comment_lines,
            public_apis: docs.public_apis,
            documented_apis: docs.documented_apis,
        }))
    }
}

fn any_exists(root: &Path, names: &[&str]) -> bool {
    names.iter().any(|name| root.join(name).exists())
}

fn read_readme(root: &Path) -> Option<String> {
    README_NAMES
        .iter()
        .find_map(|name| std::fs::read_to_string(root.join(name)).ok())
}

fn readme(root: &Path) -> (bool, usize) {
    match read_readme(root) {
        Some(content) => (true, content.split_whitespace().count()),
        None => (false, 0),
    }
}

fn code_fence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^```").expect("valid regex"))
}

fn has_examples(root: &Path) -> bool {
    if EXAMPLE_DIRS.iter().any(|dir| root.join(dir).is_dir()) {
        return true;
    }
    std::fs::read_to_string(root.join("README.md"))
        .map(|content| code_fence().find_iter(&content).count() >= MIN_README_CODE_FENCES)
        .unwrap_or(false)
}

/// Diagram images named after what they depict, or Mermaid blocks in
/// Markdown, under `docs/` (the project root when there is none)
fn has_diagrams(root: &Path) -> bool {
    let docs = root.join("docs");
    let base = if docs.is_dir() { docs } else { root.to_path_buf() };
    let walker = WalkBuilder::new(&base)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build();
    for entry in walker.flatten() {
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if DIAGRAM_EXTENSIONS.contains(&extension.as_str())
            && DIAGRAM_KEYWORDS.iter().any(|k| name.contains(k))
        {
            return true;
        }
        if extension == "md"
            && std::fs::read_to_string(path).is_ok_and(|content| content.contains("```mermaid"))
        {
            return true;
        }
    }
    false
}
