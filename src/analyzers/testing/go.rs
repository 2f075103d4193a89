use super::LanguageTesting;
use crate::models::TestFunctionMetric;
use crate::parsers::{start_line, walk_tree, GoFile, GoWorkspace};
use tree_sitter::Node;

/// Imports that make a test depend on the network, a database or processes
const EXTERNAL_PACKAGES: &[&str] = &[
    "net/http",
    "net",
    "database/sql",
    "os/exec",
    "net/rpc",
    "net/smtp",
];
const EXTERNAL_HINTS: &[&str] = &["http", "sql", "redis", "mongo"];

/// `*testing.T` methods that report a failure
const TESTING_ASSERTIONS: &[&str] = &["Error", "Errorf", "Fatal", "Fatalf", "Fail", "FailNow"];
const TESTIFY_ASSERTIONS: &[&str] = &[
    "Equal", "NotEqual", "True", "False", "Nil", "NotNil", "Contains", "NoError", "Len", "Empty",
    "Greater", "Less", "ErrorIs", "ErrorAs",
];

pub(super) fn analyze(ws: &GoWorkspace) -> LanguageTesting {
    let mut result = LanguageTesting::default();
    for pkg in ws.source_packages() {
        result.source_files += pkg.files.len();
        result.source_loc += pkg.lines();
    }
    for pkg in ws.test_packages() {
        result.test_files += pkg.files.len();
        result.test_loc += pkg.lines();
        for file in &pkg.files {
            result.tests.extend(test_functions(file));
        }
    }
    result
}

fn has_external_dep(file: &GoFile) -> bool {
    file.imports.iter().any(|import| {
        EXTERNAL_PACKAGES.contains(&import.path.as_str())
            || (import.path.contains("github.com")
                && EXTERNAL_HINTS.iter().any(|h| import.path.contains(h)))
    })
}

/// `func TestX(t *testing.T)` at the top level of the file
fn is_test_function(file: &GoFile, decl: Node<'_>) -> bool {
    if decl.kind() != "function_declaration" {
        return false;
    }
    let named_test = decl
        .child_by_field_name("name")
        .is_some_and(|n| file.text(n).starts_with("Test"));
    if !named_test {
        return false;
    }
    let Some(params) = decl.child_by_field_name("parameters") else {
        return false;
    };
    let mut cursor = params.walk();
    let declarations: Vec<Node<'_>> = params
        .named_children(&mut cursor)
        .filter(|p| p.kind() != "comment")
        .collect();
    let [param] = declarations.as_slice() else {
        return false;
    };
    let mut names = param.walk();
    if param.children_by_field_name("name", &mut names).count() > 1 {
        return false;
    }
    param.child_by_field_name("type").is_some_and(|t| {
        file.text(t)
            .chars()
            .filter(|c| !c.is_whitespace())
            .eq("*testing.T".chars())
    })
}

fn count_assertions(file: &GoFile, body: Node<'_>) -> usize {
    let mut count = 0;
    walk_tree(body, |node| {
        if node.kind() != "call_expression" {
            return true;
        }
        let selector = node
            .child_by_field_name("function")
            .filter(|f| f.kind() == "selector_expression");
        let Some(selector) = selector else {
            return true;
        };
        let method = selector
            .child_by_field_name("field")
            .map_or("", |f| file.text(f));
        let receiver = selector
            .child_by_field_name("operand")
            .map_or("", |o| file.text(o));
        if TESTING_ASSERTIONS.contains(&method)
            || TESTIFY_ASSERTIONS.contains(&method)
            || matches!(receiver, "assert" | "require")
        {
            count += 1;
        }
        true
    });
    count
}

fn test_functions(file: &GoFile) -> Vec<TestFunctionMetric> {
    let external = has_external_dep(file);
    let root = file.root();
    let mut cursor = root.walk();
    root.children(&mut cursor)
        .filter(|decl| is_test_function(file, *decl))
        .filter_map(|decl| {
            let name = decl.child_by_field_name("name")?;
            Some(TestFunctionMetric {
                name: file.text(name).to_string(),
                file: file.rel_path.clone(),
                line: start_line(decl),
                assertion_count: decl
                    .child_by_field_name("body")
                    .map_or(0, |body| count_assertions(file, body)),
                has_external_dep: external,
            })
        })
        .collect()
}
