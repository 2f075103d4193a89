use super::SourceDocs;
use crate::models::SourceFile;
use crate::parsers::{count_lines, walk_tree, ParsedSyntaxFile};
use std::borrow::Cow;
use tracing::warn;
use tree_sitter::Node;

/// Go sources are scanned line by line: `//` and `/* */` comment lines, and
/// exported top-level funcs/methods/types directly preceded by a comment.
pub(super) fn go_docs<'a>(files: impl Iterator<Item = &'a SourceFile>) -> SourceDocs {
    let mut docs = SourceDocs::default();
    for file in files {
        let content = if file.content.is_empty() {
            match std::fs::read_to_string(&file.path) {
                Ok(content) => Cow::Owned(content),
                Err(e) => {
                    warn!("Skipping {}: {}", file.rel_path, e);
                    continue;
                }
            }
        } else {
            Cow::Borrowed(file.content.as_str())
        };
        docs.add(go_file_docs(&content));
    }
    docs
}

fn go_file_docs(content: &str) -> SourceDocs {
    let mut docs = SourceDocs {
        total_lines: count_lines(content),
        ..SourceDocs::default()
    };
    let mut in_block_comment = false;
    let mut in_type_group = false;
    let mut group_documented = false;
    let mut group_depth = 0i32;
    let mut previous_is_comment = false;

    for line in content.lines() {
        let trimmed = line.trim();
        let is_comment = if in_block_comment {
            if trimmed.contains("*/") {
                in_block_comment = false;
            }
            true
        } else if trimmed.starts_with("//") {
            true
        } else if trimmed.starts_with("/*") {
            in_block_comment = !trimmed.contains("*/");
            true
        } else {
            false
        };
        if is_comment {
            docs.comment_lines += 1;
            previous_is_comment = true;
            continue;
        }

        if in_type_group {
            // specs sit at depth 0; deeper lines belong to struct bodies
            let depth = group_depth;
            group_depth += brace_balance(trimmed);
            if depth == 0 && trimmed == ")" {
                in_type_group = false;
            } else if depth == 0 {
                if leading_identifier(trimmed).is_some_and(is_exported) {
                    docs.public_apis += 1;
                    if previous_is_comment || group_documented {
                        docs.documented_apis += 1;
                    }
                }
            }
        } else if let Some(rest) = line.strip_prefix("type ") {
            if rest.trim_start().starts_with('(') {
                in_type_group = true;
                group_documented = previous_is_comment;
                group_depth = 0;
            } else if leading_identifier(rest.trim_start()).is_some_and(is_exported) {
                docs.public_apis += 1;
                if previous_is_comment {
                    docs.documented_apis += 1;
                }
            }
        } else if let Some(rest) = line.strip_prefix("func ") {
            if func_name(rest).is_some_and(is_exported) {
                docs.public_apis += 1;
                if previous_is_comment {
                    docs.documented_apis += 1;
                }
            }
        }
        previous_is_comment = false;
    }
    docs
}

fn brace_balance(line: &str) -> i32 {
    line.chars()
        .map(|c| match c {
            '{' => 1,
            '}' => -1,
            _ => 0,
        })
        .sum()
}

fn leading_identifier(text: &str) -> Option<&str> {
    let end = text
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}

/// Name of a func declaration after the `func ` keyword, skipping a receiver
fn func_name(rest: &str) -> Option<&str> {
    let rest = rest.trim_start();
    let rest = match rest.strip_prefix('(') {
        Some(receiver) => receiver[receiver.find(')')? + 1..].trim_start(),
        None => rest,
    };
    leading_identifier(rest)
}

fn is_exported(name: &str) -> bool {
    name.starts_with(|c: char| c.is_uppercase())
}

fn comment_lines(root: Node<'_>) -> usize {
    let mut lines = 0;
    walk_tree(root, |node| {
        if node.kind() == "comment" {
            lines += node.end_position().row - node.start_position().row + 1;
            return false;
        }
        true
    });
    lines
}

pub(super) fn python_docs(files: &[ParsedSyntaxFile]) -> SourceDocs {
    let mut docs = SourceDocs::default();
    for file in files.iter().filter(|f| !f.is_test()) {
        docs.total_lines += file.lines;
        docs.comment_lines += comment_lines(file.root());

        let root = file.root();
        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            let definition = match child.kind() {
                "decorated_definition" => child.child_by_field_name("definition"),
                "function_definition" | "class_definition" => Some(child),
                _ => None,
            };
            let Some(definition) = definition else {
                continue;
            };
            let Some(name) = definition.child_by_field_name("name") else {
                continue;
            };
            if file.text(name).starts_with('_') {
                continue;
            }
            docs.public_apis += 1;
            if has_docstring(definition) {
                docs.documented_apis += 1;
            }
        }
    }
    docs
}

/// First statement of the body is a bare string
fn has_docstring(definition: Node<'_>) -> bool {
    let Some(body) = definition.child_by_field_name("body") else {
        return false;
    };
    let mut cursor = body.walk();
    let first = body
        .named_children(&mut cursor)
        .find(|stmt| stmt.kind() != "comment");
    first.is_some_and(|stmt| {
        stmt.kind() == "expression_statement"
            && stmt.named_child(0).is_some_and(|expr| expr.kind() == "string")
    })
}

const TS_API_DECLARATIONS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "class_declaration",
    "abstract_class_declaration",
    "lexical_declaration",
    "interface_declaration",
    "type_alias_declaration",
    "enum_declaration",
];

pub(super) fn typescript_docs(files: &[ParsedSyntaxFile]) -> SourceDocs {
    let mut docs = SourceDocs::default();
    for file in files.iter().filter(|f| !f.is_test()) {
        docs.total_lines += file.lines;
        docs.comment_lines += comment_lines(file.root());

        let root = file.root();
        let mut cursor = root.walk();
        for stmt in root.named_children(&mut cursor) {
            if stmt.kind() != "export_statement" {
                continue;
            }
            let is_api = stmt
                .child_by_field_name("declaration")
                .is_some_and(|d| TS_API_DECLARATIONS.contains(&d.kind()));
            if !is_api {
                continue;
            }
            docs.public_apis += 1;
            if has_jsdoc(file, stmt) {
                docs.documented_apis += 1;
            }
        }
    }
    docs
}

/// A `/** */` block ending on the line before the declaration
fn has_jsdoc(file: &ParsedSyntaxFile, stmt: Node<'_>) -> bool {
    stmt.prev_named_sibling().is_some_and(|prev| {
        prev.kind() == "comment"
            && file.text(prev).starts_with("/**")
            && prev.end_position().row + 1 >= stmt.start_position().row
    })
}
