//! Python module graph and unused public definitions

use super::LanguageArchitecture;
use crate::graph::{depth_summary, ImportGraph};
use crate::models::{DeadExport, MetricSummary};
use crate::parsers::{start_line, walk_tree, ParsedSyntaxFile};
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::Node;

/// Dotted module name of a file: `pkg/sub/mod.py` -> `pkg.sub.mod`,
/// `pkg/__init__.py` -> `pkg`
pub(crate) fn module_name(rel_path: &str) -> String {
    let stem = rel_path
        .strip_suffix(".pyi")
        .or_else(|| rel_path.strip_suffix(".py"))
        .unwrap_or(rel_path);
    let dotted = stem.replace('/', ".");
    match dotted.strip_suffix(".__init__") {
        Some(pkg) => pkg.to_string(),
        None => dotted,
    }
}

fn is_package_init(rel_path: &str) -> bool {
    let name = rel_path.rsplit('/').next().unwrap_or(rel_path);
    name == "__init__.py" || name == "__init__.pyi"
}

/// Resolve `from ..x import y` relative to `module`. `None` when the dots
/// climb above the project root.
pub(crate) fn resolve_relative(module: &str, is_package: bool, spec: &str) -> Option<String> {
    let dots = spec.chars().take_while(|c| *c == '.').count();
    let rest = &spec[dots..];
    let mut parts: Vec<&str> = module.split('.').filter(|p| !p.is_empty()).collect();
    if !is_package {
        parts.pop();
    }
    let up = dots.saturating_sub(1);
    if up > parts.len() {
        return None;
    }
    parts.truncate(parts.len() - up);
    if !rest.is_empty() {
        parts.extend(rest.split('.'));
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("."))
    }
}

/// Project modules imported by one file
fn resolved_imports(file: &ParsedSyntaxFile, known: &HashSet<String>) -> BTreeSet<String> {
    let module = module_name(&file.rel_path);
    let is_package = is_package_init(&file.rel_path);
    let mut resolved = BTreeSet::new();

    let root = file.root();
    let mut cursor = root.walk();
    for stmt in root.children(&mut cursor) {
        collect_statement(file, stmt, &module, is_package, known, &mut resolved);
    }
    resolved.remove(&module);
    resolved
}

fn collect_statement(
    file: &ParsedSyntaxFile,
    stmt: Node<'_>,
    module: &str,
    is_package: bool,
    known: &HashSet<String>,
    out: &mut BTreeSet<String>,
) {
    match stmt.kind() {
        "import_statement" => {
            let mut cursor = stmt.walk();
            for name in stmt.children_by_field_name("name", &mut cursor) {
                let dotted = match name.kind() {
                    "aliased_import" => name.child_by_field_name("name"),
                    _ => Some(name),
                };
                if let Some(found) = dotted.and_then(|d| longest_known_prefix(file.text(d), known))
                {
                    out.insert(found);
                }
            }
        }
        "import_from_statement" => {
            let Some(source) = stmt.child_by_field_name("module_name") else {
                return;
            };
            let base = match source.kind() {
                "relative_import" => resolve_relative(module, is_package, file.text(source)),
                _ => Some(file.text(source).to_string()),
            };
            let Some(base) = base else {
                return;
            };
            let mut via_base = false;
            for name in imported_names(file, stmt) {
                let submodule = format!("{}.{}", base, name);
                if known.contains(&submodule) {
                    out.insert(submodule);
                } else {
                    via_base = true;
                }
            }
            if (via_base || stmt_has_wildcard(stmt)) && known.contains(&base) {
                out.insert(base);
            }
        }
        // Imports guarded by `if TYPE_CHECKING:` or try/except still count.
        "if_statement" | "try_statement" | "block" | "else_clause" | "except_clause" => {
            let mut cursor = stmt.walk();
            for child in stmt.named_children(&mut cursor) {
                collect_statement(file, child, module, is_package, known, out);
            }
        }
        _ => {}
    }
}

fn stmt_has_wildcard(stmt: Node<'_>) -> bool {
    let mut cursor = stmt.walk();
    let found = stmt
        .named_children(&mut cursor)
        .any(|c| c.kind() == "wildcard_import");
    found
}

/// Names listed by a `from … import` statement (original names, not aliases)
fn imported_names<'f>(file: &'f ParsedSyntaxFile, stmt: Node<'_>) -> Vec<&'f str> {
    let mut names = Vec::new();
    let mut cursor = stmt.walk();
    for name in stmt.children_by_field_name("name", &mut cursor) {
        let target = match name.kind() {
            "aliased_import" => name.child_by_field_name("name"),
            _ => Some(name),
        };
        if let Some(target) = target {
            names.push(file.text(target));
        }
    }
    names
}

fn longest_known_prefix(dotted: &str, known: &HashSet<String>) -> Option<String> {
    let parts: Vec<&str> = dotted.split('.').collect();
    (1..=parts.len())
        .rev()
        .map(|n| parts[..n].join("."))
        .find(|candidate| known.contains(candidate))
}

/// Module graph over non-test files
pub(crate) fn build_import_graph(files: &[ParsedSyntaxFile]) -> ImportGraph {
    build_with_imports(files).0
}

fn build_with_imports(files: &[ParsedSyntaxFile]) -> (ImportGraph, MetricSummary) {
    let sources: Vec<&ParsedSyntaxFile> = files.iter().filter(|f| !f.is_test()).collect();
    let known: HashSet<String> = sources.iter().map(|f| module_name(&f.rel_path)).collect();

    let mut graph = ImportGraph::new();
    let mut segments: Vec<(String, usize)> = Vec::new();
    for file in &sources {
        let module = module_name(&file.rel_path);
        graph.add_node(&module);
        for target in resolved_imports(file, &known) {
            segments.push((target.clone(), target.split('.').count()));
            graph.add_edge(&module, &target);
        }
    }
    let complexity = MetricSummary::from_values(segments.iter().map(|(m, n)| (m.as_str(), *n)));
    (graph, complexity)
}

pub(super) fn analyze(files: &[ParsedSyntaxFile]) -> LanguageArchitecture {
    let (graph, import_complexity) = build_with_imports(files);
    let loc = files.iter().filter(|f| !f.is_test()).map(|f| f.lines).sum();
    let mut result = LanguageArchitecture::from_graph(&graph, loc);

    let (max_depth, avg_depth) = depth_summary(
        files
            .iter()
            .filter(|f| !f.is_test())
            .map(|f| f.rel_path.matches('/').count()),
    );
    result.max_depth = max_depth;
    result.avg_depth = avg_depth;
    result.import_complexity = import_complexity;
    result.dead_exports = dead_exports(files);
    result
}

/// Public top-level functions and classes that no other file imports by name.
///
/// Only `from x import name` counts as a use; attribute access through a
/// module import (`import x; x.name`) is not tracked.
fn dead_exports(files: &[ParsedSyntaxFile]) -> Vec<DeadExport> {
    if files.iter().filter(|f| !f.is_test()).count() <= 1 {
        return Vec::new();
    }

    let mut importers: HashMap<&str, HashSet<&str>> = HashMap::new();
    for file in files {
        let root = file.root();
        walk_tree(root, |node| {
            if node.kind() == "import_from_statement" {
                for name in imported_names(file, node) {
                    importers
                        .entry(name)
                        .or_default()
                        .insert(file.rel_path.as_str());
                }
                return false;
            }
            true
        });
    }

    let mut dead = Vec::new();
    for file in files.iter().filter(|f| !f.is_test()) {
        let module = module_name(&file.rel_path);
        let root = file.root();
        let mut cursor = root.walk();
        for child in root.children(&mut cursor) {
            let def = match child.kind() {
                "decorated_definition" => child.child_by_field_name("definition"),
                _ => Some(child),
            };
            let Some(def) = def else { continue };
            let kind = match def.kind() {
                "function_definition" => "func",
                "class_definition" => "type",
                _ => continue,
            };
            let Some(name_node) = def.child_by_field_name("name") else {
                continue;
            };
            let name = file.text(name_node);
            if name.starts_with('_') {
                continue;
            }
            let used_elsewhere = importers
                .get(name)
                .is_some_and(|users| users.iter().any(|u| *u != file.rel_path));
            if used_elsewhere {
                continue;
            }
            dead.push(DeadExport {
                package: module.clone(),
                name: name.to_string(),
                file: file.rel_path.clone(),
                line: start_line(name_node),
                kind: kind.to_string(),
            });
        }
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::parse_files;
    use crate::models::Language;

    #[test]
    fn test_module_name() {
        assert_eq!(module_name("pkg/sub/mod.py"), "pkg.sub.mod");
        assert_eq!(module_name("pkg/__init__.py"), "pkg");
        assert_eq!(module_name("stubs/x.pyi"), "stubs.x");
        assert_eq!(module_name("main.py"), "main");
    }

    #[test]
    fn test_resolve_relative() {
        assert_eq!(
            resolve_relative("pkg.sub.mod", false, ".helpers"),
            Some("pkg.sub.helpers".to_string())
        );
        assert_eq!(
            resolve_relative("pkg.sub.mod", false, "..core"),
            Some("pkg.core".to_string())
        );
        assert_eq!(
            resolve_relative("pkg.sub", true, ".x"),
            Some("pkg.sub.x".to_string())
        );
        assert_eq!(resolve_relative("pkg.sub.mod", false, "."), Some("pkg.sub".to_string()));
        assert_eq!(resolve_relative("mod", false, "...x"), None);
    }

    #[test]
    fn test_graph_resolves_only_project_modules() {
        let files = parse_files(
            Language::Python,
            &[
                ("app/__init__.py", ""),
                (
                    "app/service.py",
                    "import os\nimport app.models as m\nfrom .utils import helper\nfrom . import models\n",
                ),
                ("app/models.py", "import json\n"),
                ("app/utils.py", "def helper():\n    return 1\n"),
            ],
        );
        let graph = build_import_graph(&files);
        let imports: Vec<&str> = graph.imports("app.service").collect();
        assert_eq!(imports, vec!["app.models", "app.utils"]);
        assert_eq!(graph.fanout("app.models"), 0);
        assert_eq!(graph.node_count(), 4);
    }

    #[test]
    fn test_dead_exports() {
        let files = parse_files(
            Language::Python,
            &[
                (
                    "lib/core.py",
                    "def used():\n    pass\n\ndef unused():\n    pass\n\ndef _private():\n    pass\n\n@dataclass\nclass Config:\n    pass\n",
                ),
                ("lib/cli.py", "from lib.core import used\n\ndef main():\n    used()\n"),
                ("tests/test_core.py", "from lib.cli import main\n"),
            ],
        );
        let dead = dead_exports(&files);
        let names: Vec<&str> = dead.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["unused", "Config"]);
        assert_eq!(dead[1].kind, "type");
        assert_eq!(dead[1].line, 11);
        assert_eq!(dead[0].package, "lib.core");
    }

    #[test]
    fn test_single_module_has_no_dead_exports() {
        let files = parse_files(Language::Python, &[("only.py", "def lonely():\n    pass\n")]);
        assert!(dead_exports(&files).is_empty());
    }

    #[test]
    fn test_import_from_own_file_is_not_a_use() {
        let files = parse_files(
            Language::Python,
            &[
                ("a.py", "from a import thing\n\ndef thing():\n    pass\n"),
                ("b.py", "x = 1\n"),
            ],
        );
        let dead = dead_exports(&files);
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].name, "thing");
    }
}
