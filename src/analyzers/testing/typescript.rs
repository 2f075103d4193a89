use super::LanguageTesting;
use crate::models::TestFunctionMetric;
use crate::parsers::{start_line, walk_tree, ParsedSyntaxFile};
use tree_sitter::Node;

const EXTERNAL_MODULES: &[&str] = &[
    "axios",
    "node-fetch",
    "pg",
    "mysql2",
    "mongoose",
    "prisma",
    "redis",
    "ioredis",
    "http",
    "https",
    "net",
    "fs",
    "child_process",
    "got",
    "superagent",
    "knex",
    "typeorm",
    "sequelize",
];

pub(super) fn analyze(files: &[ParsedSyntaxFile]) -> LanguageTesting {
    let mut result = LanguageTesting::default();
    for file in files {
        if !file.is_test() {
            result.source_files += 1;
            result.source_loc += file.lines;
            continue;
        }
        result.test_files += 1;
        result.test_loc += file.lines;

        let external = imports_external_module(file);
        walk_tree(file.root(), |node| {
            if let Some(test) = test_case(file, node, external) {
                result.tests.push(test);
            }
            true
        });
    }
    result
}

fn unquote(text: &str) -> &str {
    text.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

/// `it("...", () => ...)` / `test("...", function () ...)`
fn test_case(file: &ParsedSyntaxFile, node: Node<'_>, external: bool) -> Option<TestFunctionMetric> {
    if node.kind() != "call_expression" {
        return None;
    }
    let callee = file.text(node.child_by_field_name("function")?);
    if callee != "it" && callee != "test" {
        return None;
    }
    let args = node.child_by_field_name("arguments")?;
    let mut cursor = args.walk();
    let args: Vec<Node<'_>> = args.named_children(&mut cursor).collect();

    let name = args
        .iter()
        .find(|a| matches!(a.kind(), "string" | "template_string"))
        .map(|a| unquote(file.text(*a)))
        .filter(|n| !n.is_empty())
        .unwrap_or(callee);
    let assertion_count = args
        .iter()
        .find(|a| matches!(a.kind(), "arrow_function" | "function_expression"))
        .map_or(0, |callback| count_assertions(file, *callback));

    Some(TestFunctionMetric {
        name: name.to_string(),
        file: file.rel_path.clone(),
        line: start_line(node),
        assertion_count,
        has_external_dep: external,
    })
}

/// `expect(...)` chains count once; `assert(...)` and `assert.x(...)` too.
/// Nested callbacks are not entered.
fn count_assertions(file: &ParsedSyntaxFile, callback: Node<'_>) -> usize {
    let Some(body) = callback.child_by_field_name("body") else {
        return 0;
    };
    let mut count = 0;
    walk_tree(body, |node| match node.kind() {
        "arrow_function" | "function_expression" => false,
        "call_expression" => {
            let callee = node
                .child_by_field_name("function")
                .map_or("", |f| file.text(f));
            let is_assertion = callee == "expect"
                || callee.starts_with("expect(")
                || callee.contains("expect(")
                || callee == "assert"
                || callee.starts_with("assert.");
            if is_assertion {
                count += 1;
            }
            !is_assertion
        }
        _ => true,
    });
    count
}

/// Package a specifier belongs to: `node:` dropped, scoped names kept whole
fn top_level_package(specifier: &str) -> &str {
    let specifier = specifier.strip_prefix("node:").unwrap_or(specifier);
    let mut parts = specifier.splitn(3, '/');
    let first = parts.next().unwrap_or(specifier);
    if first.starts_with('@') {
        if let Some(second) = parts.next() {
            return &specifier[..first.len() + 1 + second.len()];
        }
    }
    first
}

fn is_external(specifier: &str) -> bool {
    !specifier.starts_with('.') && EXTERNAL_MODULES.contains(&top_level_package(specifier))
}

fn imports_external_module(file: &ParsedSyntaxFile) -> bool {
    let mut external = false;
    walk_tree(file.root(), |node| {
        if external {
            return false;
        }
        let specifier = match node.kind() {
            "import_statement" => node.child_by_field_name("source"),
            "call_expression" => node
                .child_by_field_name("function")
                .filter(|f| file.text(*f) == "require")
                .and_then(|_| node.child_by_field_name("arguments"))
                .and_then(|args| args.named_child(0))
                .filter(|arg| arg.kind() == "string"),
            _ => None,
        };
        if let Some(specifier) = specifier {
            external = is_external(unquote(file.text(specifier)));
        }
        true
    });
    external
}
