use super::LanguageTesting;
use crate::models::TestFunctionMetric;
use crate::parsers::{start_line, walk_tree, ParsedSyntaxFile};
use tree_sitter::Node;

const EXTERNAL_MODULES: &[&str] = &[
    "requests",
    "urllib",
    "httpx",
    "aiohttp",
    "sqlalchemy",
    "psycopg2",
    "pymongo",
    "redis",
    "boto3",
    "socket",
    "http",
    "subprocess",
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
            if node.kind() != "function_definition" {
                return true;
            }
            let Some(name) = node.child_by_field_name("name") else {
                return true;
            };
            if file.text(name).starts_with("test_") {
                result.tests.push(TestFunctionMetric {
                    name: file.text(name).to_string(),
                    file: file.rel_path.clone(),
                    line: start_line(name),
                    assertion_count: count_assertions(file, node),
                    has_external_dep: external,
                });
            }
            true
        });
    }
    result
}

/// `assert`, `self.assert*()`, `self.fail()` and `pytest.raises()` in the
/// body, not counting nested functions
fn count_assertions(file: &ParsedSyntaxFile, function: Node<'_>) -> usize {
    let Some(body) = function.child_by_field_name("body") else {
        return 0;
    };
    let mut count = 0;
    walk_tree(body, |node| match node.kind() {
        "function_definition" => false,
        "assert_statement" => {
            count += 1;
            true
        }
        "call" => {
            let callee = node
                .child_by_field_name("function")
                .filter(|f| f.kind() == "attribute")
                .map_or("", |f| file.text(f));
            if callee.starts_with("self.assert") || callee == "self.fail" || callee == "pytest.raises" {
                count += 1;
            }
            true
        }
        _ => true,
    });
    count
}

fn top_level_module(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

fn imports_external_module(file: &ParsedSyntaxFile) -> bool {
    let mut external = false;
    walk_tree(file.root(), |node| {
        if external {
            return false;
        }
        let mut modules = Vec::new();
        match node.kind() {
            "import_statement" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    let module = match name.kind() {
                        "aliased_import" => name.child_by_field_name("name"),
                        _ => Some(name),
                    };
                    modules.extend(module.map(|m| file.text(m)));
                }
            }
            "import_from_statement" => {
                modules.extend(node.child_by_field_name("module_name").map(|m| file.text(m)));
            }
            _ => return true,
        }
        external = modules
            .iter()
            .any(|m| EXTERNAL_MODULES.contains(&top_level_module(m)));
        false
    });
    external
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::parse_files;
    use crate::models::Language;

    #[test]
    fn test_python_tests_and_assertions() {
        let files = parse_files(
            Language::Python,
            &[
                ("app/calc.py", "def add(a, b):\n    return a + b\n"),
                (
                    "tests/test_calc.py",
                    r#"import pytest
from app.calc import add


class TestCalc:
    def test_add(self):
        self.assertEqual(add(1, 2), 3)
        assert add(0, 0) == 0

    def test_raises(self):
        with pytest.raises(TypeError):
            add(None, 1)

        def test_nested():
            assert False


def helper():
    assert True
"#,
                ),
                (
                    "tests/test_api.py",
                    "import requests.adapters as ra\n\n\ndef test_fetch():\n    self.fail()\n",
                ),
            ],
        );
        let result = analyze(&files);
        assert_eq!(result.source_files, 1);
        assert_eq!(result.test_files, 2);
        assert_eq!(result.source_loc, 2);

        let found: Vec<(&str, usize, bool)> = result
            .tests
            .iter()
            .map(|t| (t.name.as_str(), t.assertion_count, t.has_external_dep))
            .collect();
        assert_eq!(
            found,
            vec![
                ("test_add", 2, false),
                ("test_raises", 1, false),
                ("test_nested", 1, false),
                ("test_fetch", 1, true),
            ]
        );
        assert_eq!(result.tests[0].line, 6);
    }
}
