//! TypeScript file graph and unused exports

use super::{segment_count, LanguageArchitecture};
use crate::graph::{depth_summary, ImportGraph};
use crate::models::{DeadExport, MetricSummary};
use crate::parsers::{start_line, walk_tree, ParsedSyntaxFile};
use std::collections::{BTreeSet, HashMap, HashSet};
use tree_sitter::Node;

const EXTENSIONS: [&str; 4] = [".tsx", ".ts", ".jsx", ".js"];

/// Unit identity of a path: extension and trailing `/index` removed
pub(crate) fn unit_name(rel_path: &str) -> String {
    let stem = EXTENSIONS
        .iter()
        .find_map(|ext| rel_path.strip_suffix(ext))
        .unwrap_or(rel_path);
    stem.strip_suffix("/index").unwrap_or(stem).to_string()
}

/// Join `specifier` onto `dir`, folding `.` and `..`. `None` when it escapes the root.
fn join_clean(dir: &str, specifier: &str) -> Option<String> {
    let mut parts: Vec<&str> = dir.split('/').filter(|p| !p.is_empty()).collect();
    for segment in specifier.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop()?;
            }
            other => parts.push(other),
        }
    }
    Some(parts.join("/"))
}

/// Resolve a module specifier from `importer` to a known unit. Bare package
/// specifiers never resolve.
pub(crate) fn resolve_specifier(
    importer: &str,
    specifier: &str,
    known: &HashSet<String>,
) -> Option<String> {
    if !specifier.starts_with('.') {
        return None;
    }
    let dir = importer.rsplit_once('/').map_or("", |(dir, _)| dir);
    let joined = join_clean(dir, specifier)?;
    let unit = unit_name(&joined);
    (known.contains(&unit) && unit != unit_name(importer)).then_some(unit)
}

fn string_value<'f>(file: &'f ParsedSyntaxFile, node: Node<'_>) -> &'f str {
    file.text(node).trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// Every module specifier a file mentions: static imports, re-exports,
/// `require("x")` and `import("x")`
fn specifiers<'f>(file: &'f ParsedSyntaxFile) -> Vec<&'f str> {
    let mut specs = Vec::new();
    walk_tree(file.root(), |node| {
        match node.kind() {
            "import_statement" | "export_statement" => {
                if let Some(source) = node.child_by_field_name("source") {
                    specs.push(string_value(file, source));
                }
            }
            "call_expression" => {
                let is_loader = node
                    .child_by_field_name("function")
                    .is_some_and(|f| f.kind() == "import" || file.text(f) == "require");
                if is_loader {
                    if let Some(arg) = node
                        .child_by_field_name("arguments")
                        .and_then(|args| args.named_child(0))
                        .filter(|arg| arg.kind() == "string")
                    {
                        specs.push(string_value(file, arg));
                    }
                }
            }
            _ => {}
        }
        true
    });
    specs
}

/// File graph over non-test files
pub(crate) fn build_import_graph(files: &[ParsedSyntaxFile]) -> ImportGraph {
    build_with_imports(files).0
}

fn build_with_imports(files: &[ParsedSyntaxFile]) -> (ImportGraph, MetricSummary) {
    let sources: Vec<&ParsedSyntaxFile> = files.iter().filter(|f| !f.is_test()).collect();
    let known: HashSet<String> = sources.iter().map(|f| unit_name(&f.rel_path)).collect();

    let mut graph = ImportGraph::new();
    let mut segments: Vec<(String, usize)> = Vec::new();
    for file in &sources {
        let unit = unit_name(&file.rel_path);
        graph.add_node(&unit);
        let targets: BTreeSet<String> = specifiers(file)
            .into_iter()
            .filter_map(|specifier| resolve_specifier(&file.rel_path, specifier, &known))
            .collect();
        for target in targets {
            segments.push((target.clone(), segment_count(&target)));
            graph.add_edge(&unit, &target);
        }
    }
    let complexity = MetricSummary::from_values(segments.iter().map(|(u, n)| (u.as_str(), *n)));
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

/// Names a file pulls in from other modules: default, named and namespace
/// imports plus re-exported specifiers
fn imported_names<'f>(file: &'f ParsedSyntaxFile) -> Vec<&'f str> {
    let mut names = Vec::new();
    walk_tree(file.root(), |node| match node.kind() {
        "import_clause" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    names.push(file.text(child));
                }
            }
            true
        }
        "namespace_import" => {
            let mut cursor = node.walk();
            for child in node.named_children(&mut cursor) {
                if child.kind() == "identifier" {
                    names.push(file.text(child));
                }
            }
            false
        }
        "import_specifier" => {
            if let Some(name) = node.child_by_field_name("name") {
                names.push(file.text(name));
            }
            false
        }
        "export_statement" => {
            if node.child_by_field_name("source").is_some() {
                names.extend(export_clause_names(node).into_iter().map(|n| file.text(n)));
            }
            false
        }
        _ => true,
    });
    names
}

/// Name nodes of `export { a, b as c }` specifiers
fn export_clause_names(stmt: Node<'_>) -> Vec<Node<'_>> {
    let mut names = Vec::new();
    let mut cursor = stmt.walk();
    for child in stmt.named_children(&mut cursor) {
        if child.kind() != "export_clause" {
            continue;
        }
        let mut inner = child.walk();
        for specifier in child.named_children(&mut inner) {
            if let Some(name) = specifier.child_by_field_name("name") {
                names.push(name);
            }
        }
    }
    names
}

/// Declarations exported by one file as `(name node, kind)`
fn exported_declarations<'t>(file: &'t ParsedSyntaxFile) -> Vec<(Node<'t>, &'static str)> {
    let mut out = Vec::new();
    let root = file.root();
    let mut cursor = root.walk();
    for stmt in root.children(&mut cursor) {
        if stmt.kind() != "export_statement" || stmt.child_by_field_name("source").is_some() {
            continue;
        }
        let Some(decl) = stmt.child_by_field_name("declaration") else {
            out.extend(export_clause_names(stmt).into_iter().map(|n| (n, "var")));
            continue;
        };
        let kind = match decl.kind() {
            "function_declaration" | "generator_function_declaration" => "func",
            "class_declaration"
            | "abstract_class_declaration"
            | "interface_declaration"
            | "type_alias_declaration"
            | "enum_declaration" => "type",
            "lexical_declaration" | "variable_declaration" => {
                let mut inner = decl.walk();
                for declarator in decl.named_children(&mut inner) {
                    if let Some(name) = declarator
                        .child_by_field_name("name")
                        .filter(|n| n.kind() == "identifier")
                    {
                        out.push((name, "var"));
                    }
                }
                continue;
            }
            _ => continue,
        };
        if let Some(name) = decl.child_by_field_name("name") {
            out.push((name, kind));
        }
    }
    out
}

/// Exports whose name no other file imports. Aliased and wildcard re-exports
/// are matched by name only.
fn dead_exports(files: &[ParsedSyntaxFile]) -> Vec<DeadExport> {
    if files.iter().filter(|f| !f.is_test()).count() <= 1 {
        return Vec::new();
    }

    let mut importers: HashMap<&str, HashSet<&str>> = HashMap::new();
    for file in files {
        for name in imported_names(file) {
            importers.entry(name).or_default().insert(file.rel_path.as_str());
        }
    }

    let mut dead = Vec::new();
    for file in files.iter().filter(|f| !f.is_test()) {
        let unit = unit_name(&file.rel_path);
        for (name_node, kind) in exported_declarations(file) {
            let name = file.text(name_node);
            let used_elsewhere = importers
                .get(name)
                .is_some_and(|users| users.iter().any(|u| *u != file.rel_path));
            if used_elsewhere {
                continue;
            }
            dead.push(DeadExport {
                package: unit.clone(),
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
    fn test_unit_name() {
        assert_eq!(unit_name("src/app.ts"), "src/app");
        assert_eq!(unit_name("src/ui/index.tsx"), "src/ui");
        assert_eq!(unit_name("index.ts"), "index");
    }

    #[test]
    fn test_resolve_specifier() {
        let known: HashSet<String> = ["src/a", "src/lib", "shared/util"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(
            resolve_specifier("src/a.ts", "./lib", &known),
            Some("src/lib".to_string())
        );
        assert_eq!(
            resolve_specifier("src/a.ts", "../shared/util.js", &known),
            Some("shared/util".to_string())
        );
        assert_eq!(resolve_specifier("src/a.ts", "react", &known), None);
        assert_eq!(resolve_specifier("src/a.ts", "./a", &known), None);
        assert_eq!(resolve_specifier("a.ts", "../../x", &known), None);
    }

    #[test]
    fn test_graph_and_cycles() {
        let files = parse_files(
            Language::TypeScript,
            &[
                ("src/a.ts", "import { b } from './b';\nexport const a = () => b();\n"),
                ("src/b.ts", "import { c } from \"./c\";\nexport function b() { return c(); }\n"),
                (
                    "src/c.ts",
                    "const { a } = require('./a');\nexport function c() { return a; }\n",
                ),
                ("src/view.tsx", "import React from 'react';\nexport { b } from './b';\n"),
            ],
        );
        let graph = build_import_graph(&files);
        assert_eq!(graph.imports("src/view").collect::<Vec<_>>(), vec!["src/b"]);
        assert_eq!(
            graph.find_cycles(),
            vec![vec!["src/a".to_string(), "src/b".to_string(), "src/c".to_string()]]
        );
    }

    #[test]
    fn test_dead_exports() {
        let files = parse_files(
            Language::TypeScript,
            &[
                (
                    "src/model.ts",
                    "export interface User { id: number }\nexport type Id = string;\nexport class Repo {}\nexport const LIMIT = 10, OTHER = 2;\nfunction local() {}\nexport { local };\n",
                ),
                (
                    "src/app.ts",
                    "import { User, Repo as R } from './model';\nimport * as cfg from './config';\nexport function main(u: User) {}\n",
                ),
                ("src/app.test.ts", "import { main } from './app';\nimport { OTHER } from './model';\n"),
            ],
        );
        let dead = dead_exports(&files);
        let names: Vec<(&str, &str)> = dead
            .iter()
            .map(|d| (d.name.as_str(), d.kind.as_str()))
            .collect();
        assert_eq!(names, vec![("Id", "type"), ("LIMIT", "var"), ("local", "var")]);
        assert_eq!(dead[0].line, 2);
        assert_eq!(dead[0].package, "src/model");
    }

    #[test]
    fn test_single_file_has_no_dead_exports() {
        let files = parse_files(Language::TypeScript, &[("index.ts", "export const x = 1;\n")]);
        assert!(dead_exports(&files).is_empty());
    }
}
