//! Project file discovery and classification
//!
//! Walks the project respecting `.gitignore`, keeps files of the supported
//! languages and assigns each one a [`FileRole`].

use crate::models::{DiscoveredFile, FileRole, Language};
use anyhow::{bail, Context, Result};
use ignore::WalkBuilder;
use regex::Regex;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Directories never descended into
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    "testdata",
    "__pycache__",
    "dist",
    "build",
    ".venv",
    "venv",
    "env",
];

/// Result of walking one project
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<DiscoveredFile>,
    pub skipped: usize,
}

impl Discovery {
    pub fn count(&self, role: FileRole) -> usize {
        self.files.iter().filter(|f| f.role == role).count()
    }
}

/// Discover supported files under `root`, optionally restricted to `languages`
pub fn discover(root: &Path, languages: Option<&[Language]>) -> Result<Discovery> {
    let meta = std::fs::metadata(root)
        .with_context(|| format!("Cannot access {}", root.display()))?;
    if !meta.is_dir() {
        bail!("{} is not a directory", root.display());
    }

    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(false)
        .git_exclude(true)
        .require_git(false)
        .follow_links(false)
        .filter_entry(|entry| {
            let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
            let name = entry.file_name().to_string_lossy();
            !(is_dir && entry.depth() > 0 && SKIP_DIRS.contains(&name.as_ref()))
        });

    let mut discovery = Discovery::default();
    for entry in builder.build() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                discovery.skipped += 1;
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.path();
        let Some(language) = Language::from_path(path) else {
            continue;
        };
        if languages.is_some_and(|allowed| !allowed.contains(&language)) {
            continue;
        }
        let rel_path = match path.strip_prefix(root) {
            Ok(rel) => rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/"),
            Err(_) => {
                discovery.skipped += 1;
                continue;
            }
        };

        let (role, exclude_reason) = if is_vendor_path(&rel_path) {
            (FileRole::Excluded, Some("vendor".to_string()))
        } else if language == Language::Go && is_generated(path) {
            (FileRole::Generated, None)
        } else {
            (classify_role(language, &rel_path), None)
        };

        discovery.files.push(DiscoveredFile {
            path: path.to_path_buf(),
            rel_path,
            language,
            role,
            exclude_reason,
        });
    }

    discovery.files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    debug!(
        "Discovered {} files ({} source, {} test) under {}",
        discovery.files.len(),
        discovery.count(FileRole::Source),
        discovery.count(FileRole::Test),
        root.display()
    );
    Ok(discovery)
}

/// Role of a file from its name and location
pub fn classify_role(language: Language, rel_path: &str) -> FileRole {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    match language {
        Language::Go => {
            if name.ends_with("_test.go") {
                FileRole::Test
            } else if name.starts_with('_') || name.starts_with('.') {
                FileRole::Excluded
            } else {
                FileRole::Source
            }
        }
        Language::Python => {
            let stem = name
                .strip_suffix(".pyi")
                .or_else(|| name.strip_suffix(".py"))
                .unwrap_or(name);
            if stem.starts_with("test_") || stem.ends_with("_test") || stem == "conftest" {
                FileRole::Test
            } else if (name.starts_with('_') && stem != "__init__") || name.starts_with('.') {
                FileRole::Excluded
            } else {
                FileRole::Source
            }
        }
        Language::TypeScript => {
            let lower = name.to_ascii_lowercase();
            let test_suffix = [".test.ts", ".spec.ts", ".test.tsx", ".spec.tsx"]
                .iter()
                .any(|s| lower.ends_with(s));
            let in_tests_dir = rel_path.split('/').any(|seg| seg == "__tests__");
            if test_suffix || in_tests_dir {
                FileRole::Test
            } else if name.starts_with('_') || name.starts_with('.') {
                FileRole::Excluded
            } else {
                FileRole::Source
            }
        }
    }
}

fn is_vendor_path(rel_path: &str) -> bool {
    rel_path.split('/').any(|seg| seg == "vendor")
}

fn generated_pattern() -> &'static Regex {
    static GENERATED: OnceLock<Regex> = OnceLock::new();
    GENERATED.get_or_init(|| {
        Regex::new(r"^// Code generated .* DO NOT EDIT\.$").expect("valid regex")
    })
}

/// Go files carrying the generated-code marker before the package clause
fn is_generated(path: &Path) -> bool {
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Cannot open {}: {}", path.display(), e);
            return false;
        }
    };
    for line in BufReader::new(file).lines() {
        let Ok(line) = line else { return false };
        if line.starts_with("package ") {
            return false;
        }
        if generated_pattern().is_match(&line) {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create dirs");
        }
        fs::write(path, content).expect("write file");
    }

    #[test]
    fn test_classify_role() {
        assert_eq!(classify_role(Language::Go, "pkg/a_test.go"), FileRole::Test);
        assert_eq!(classify_role(Language::Go, "pkg/_scratch.go"), FileRole::Excluded);
        assert_eq!(classify_role(Language::Go, "pkg/a.go"), FileRole::Source);
        assert_eq!(classify_role(Language::Python, "tests/test_a.py"), FileRole::Test);
        assert_eq!(classify_role(Language::Python, "a_test.py"), FileRole::Test);
        assert_eq!(classify_role(Language::Python, "conftest.py"), FileRole::Test);
        assert_eq!(classify_role(Language::Python, "pkg/__init__.py"), FileRole::Source);
        assert_eq!(classify_role(Language::Python, "pkg/_internal.py"), FileRole::Excluded);
        assert_eq!(classify_role(Language::TypeScript, "src/a.spec.tsx"), FileRole::Test);
        assert_eq!(classify_role(Language::TypeScript, "src/__tests__/a.ts"), FileRole::Test);
        assert_eq!(classify_role(Language::TypeScript, "src/a.ts"), FileRole::Source);
    }

    #[test]
    fn test_discover_skips_and_marks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write(root, "main.go", "package main\n");
        write(
            root,
            "gen.go",
            "// Copyright 2024\n// Code generated by stringer. DO NOT EDIT.\n\npackage main\n",
        );
        write(root, "vendor/lib/lib.go", "package lib\n");
        write(root, "node_modules/x/index.ts", "export {}\n");
        write(root, "app/util.py", "x = 1\n");
        write(root, "ignored/skip.py", "x = 1\n");
        write(root, ".gitignore", "ignored/\n");
        write(root, "README.md", "# hi\n");

        let discovery = discover(root, None).expect("discover");
        let paths: Vec<&str> = discovery.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["app/util.py", "gen.go", "main.go", "vendor/lib/lib.go"]);

        let gen = &discovery.files[1];
        assert_eq!(gen.role, FileRole::Generated);
        let vendored = &discovery.files[3];
        assert_eq!(vendored.role, FileRole::Excluded);
        assert_eq!(vendored.exclude_reason.as_deref(), Some("vendor"));
    }

    #[test]
    fn test_discover_language_filter() {
        let dir = tempfile::tempdir().expect("tempdir");
        write(dir.path(), "a.go", "package a\n");
        write(dir.path(), "b.py", "x = 1\n");
        let discovery = discover(dir.path(), Some(&[Language::Python])).expect("discover");
        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.files[0].language, Language::Python);
    }

    #[test]
    fn test_discover_rejects_missing_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(discover(&dir.path().join("missing"), None).is_err());
    }
}
