//! Regroup discovered files into one analysis target per language

use crate::models::{AnalysisTarget, DiscoveredFile, FileRole, Language, SourceFile};
use crate::parsers::count_lines;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

/// Source and test files only, content loaded for the syntax-tree languages.
/// Targets come out in [`Language::ALL`] order with files sorted by path;
/// a repeated path keeps its first occurrence.
pub fn build_targets(root: &Path, files: &[DiscoveredFile]) -> Vec<AnalysisTarget> {
    let mut grouped: BTreeMap<Language, Vec<SourceFile>> = BTreeMap::new();
    for file in files {
        if !matches!(file.role, FileRole::Source | FileRole::Test) {
            continue;
        }
        let content = match std::fs::read_to_string(&file.path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping {}: {}", file.rel_path, e);
                continue;
            }
        };
        let lines = count_lines(&content);
        grouped.entry(file.language).or_default().push(SourceFile {
            path: file.path.clone(),
            rel_path: file.rel_path.clone(),
            language: file.language,
            lines,
            // the Go loader reads its files itself
            content: if file.language == Language::Go {
                String::new()
            } else {
                content
            },
            role: file.role,
        });
    }

    Language::ALL
        .into_iter()
        .filter_map(|language| {
            let mut files = grouped.remove(&language)?;
            files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
            files.dedup_by(|later, earlier| later.rel_path == earlier.rel_path);
            debug!("{} target: {} files", language, files.len());
            Some(AnalysisTarget::new(language, root, files))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::write_files;

    fn discovered(root: &Path, rel: &str, role: FileRole) -> DiscoveredFile {
        DiscoveredFile {
            path: root.join(rel),
            rel_path: rel.to_string(),
            language: Language::from_path(Path::new(rel)).expect("supported extension"),
            role,
            exclude_reason: None,
        }
    }

    #[test]
    fn test_build_targets_groups_and_filters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path();
        write_files(
            root,
            &[
                ("b.py", "x = 1\ny = 2\n"),
                ("a.py", "z = 3\n"),
                ("main.go", "package main\n\nfunc main() {}\n"),
                ("gen.go", "// Code generated by x. DO NOT EDIT.\npackage main\n"),
                ("vendor/lib.ts", "export const a = 1;\n"),
            ],
        );
        let files = vec![
            discovered(root, "b.py", FileRole::Source),
            discovered(root, "a.py", FileRole::Test),
            discovered(root, "main.go", FileRole::Source),
            discovered(root, "gen.go", FileRole::Generated),
            discovered(root, "vendor/lib.ts", FileRole::Excluded),
            discovered(root, "missing.py", FileRole::Source),
            discovered(root, "b.py", FileRole::Test),
        ];

        let targets = build_targets(root, &files);
        let languages: Vec<Language> = targets.iter().map(|t| t.language()).collect();
        assert_eq!(languages, vec![Language::Go, Language::Python]);

        let go = &targets[0];
        assert_eq!(go.files().len(), 1);
        assert_eq!(go.files()[0].lines, 3);
        assert!(go.files()[0].content.is_empty());

        let python = &targets[1];
        let paths: Vec<&str> = python.files().iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.py"]);
        assert_eq!(python.files()[1].content, "x = 1\ny = 2\n");
        assert_eq!(python.files()[1].role, FileRole::Source);
        assert_eq!(python.source_lines(), 2);
    }
}
