use crate::analyzers::{per_kloc, percent};
use crate::models::C2LanguageMetrics;
use crate::parsers::{walk_tree, ParsedSyntaxFile};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tree_sitter::Node;

const COMMON_NUMBERS: &[&str] = &["0", "1", "-1", "2", "100", "0.0", "1.0"];

fn snake_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-z0-9]*(_[a-z0-9]+)*$").expect("valid regex"))
}

fn upper_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]*$").expect("valid regex"))
}

#[derive(Default)]
struct Counts {
    annotated: usize,
    params: usize,
    functions: usize,
    names: usize,
    consistent_names: usize,
    magic: usize,
    optional_params: usize,
    guarded_params: usize,
}

pub(super) fn analyze(files: &[ParsedSyntaxFile], root: &Path) -> C2LanguageMetrics {
    let sources: Vec<&ParsedSyntaxFile> = files.iter().filter(|f| !f.is_test()).collect();
    let loc: usize = sources.iter().map(|f| f.lines).sum();

    let mut counts = Counts::default();
    for file in &sources {
        count_functions(file, &mut counts);
        count_class_names(file, &mut counts);
        counts.magic += magic_numbers(file);
    }

    C2LanguageMetrics {
        type_annotation_coverage: percent(counts.annotated, counts.params + counts.functions, 0.0),
        naming_consistency: percent(counts.consistent_names, counts.names, 100.0),
        magic_number_count: counts.magic,
        magic_number_ratio: per_kloc(counts.magic, loc),
        type_strictness: if has_type_checker(root) { 1.0 } else { 0.0 },
        null_safety: percent(counts.guarded_params, counts.optional_params, 100.0),
        total_functions: counts.functions,
        total_identifiers: counts.names,
        loc,
    }
}

/// Name of a parameter node; `None` for bare separators such as `*` or `/`
fn param_name<'f>(file: &'f ParsedSyntaxFile, param: Node<'_>) -> Option<&'f str> {
    if param.kind() == "identifier" {
        return Some(file.text(param));
    }
    if let Some(name) = param.child_by_field_name("name") {
        return Some(file.text(name));
    }
    // typed_parameter has no name field
    let mut cursor = param.walk();
    let first = param.named_children(&mut cursor).next()?;
    match first.kind() {
        "identifier" => Some(file.text(first)),
        _ => None,
    }
}

fn is_optional_annotation(annotation: &str) -> bool {
    annotation.starts_with("Optional[")
        || annotation.contains(".Optional[")
        || annotation
            .split('|')
            .map(str::trim)
            .any(|part| part == "None")
}

fn count_functions(file: &ParsedSyntaxFile, counts: &mut Counts) {
    walk_tree(file.root(), |node| {
        if node.kind() != "function_definition" {
            return true;
        }
        counts.functions += 1;
        if node.child_by_field_name("return_type").is_some() {
            counts.annotated += 1;
        }
        if let Some(name) = node.child_by_field_name("name") {
            check_function_name(file.text(name), counts);
        }

        let Some(params) = node.child_by_field_name("parameters") else {
            return true;
        };
        let body = node.child_by_field_name("body");
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            let name = param_name(file, param);
            let receiver = matches!(name, Some("self" | "cls"));
            match param.kind() {
                "identifier" | "default_parameter" if !receiver => counts.params += 1,
                "typed_parameter" | "typed_default_parameter" if !receiver => {
                    counts.params += 1;
                    counts.annotated += 1;
                    let optional = param
                        .child_by_field_name("type")
                        .is_some_and(|t| is_optional_annotation(file.text(t)));
                    if let (true, Some(name)) = (optional, name) {
                        counts.optional_params += 1;
                        if body.is_some_and(|b| has_none_check(file, b, name)) {
                            counts.guarded_params += 1;
                        }
                    }
                }
                "list_splat_pattern" | "dictionary_splat_pattern" => counts.params += 1,
                _ => {}
            }
        }
        true
    });
}

fn check_function_name(name: &str, counts: &mut Counts) {
    if name.len() <= 1 || (name.starts_with("__") && name.ends_with("__")) {
        return;
    }
    counts.names += 1;
    if snake_case().is_match(name.trim_start_matches('_')) {
        counts.consistent_names += 1;
    }
}

fn count_class_names(file: &ParsedSyntaxFile, counts: &mut Counts) {
    walk_tree(file.root(), |node| {
        if node.kind() == "class_definition" {
            if let Some(name) = node.child_by_field_name("name") {
                let name = file.text(name);
                if name.len() > 1 {
                    counts.names += 1;
                    if name.starts_with(|c: char| c.is_ascii_uppercase()) {
                        counts.consistent_names += 1;
                    }
                }
            }
        }
        true
    });
}

/// `name is None` / `name is not None` anywhere in `body`
fn has_none_check(file: &ParsedSyntaxFile, body: Node<'_>, name: &str) -> bool {
    let mut found = false;
    walk_tree(body, |node| {
        if found {
            return false;
        }
        if node.kind() != "comparison_operator" {
            return true;
        }
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        let is_op = children.iter().any(|c| matches!(c.kind(), "is" | "is not"));
        let has_none = children.iter().any(|c| c.kind() == "none");
        let has_name = children
            .iter()
            .any(|c| c.kind() == "identifier" && file.text(*c) == name);
        found = is_op && has_none && has_name;
        true
    });
    found
}

fn magic_numbers(file: &ParsedSyntaxFile) -> usize {
    let mut count = 0;
    walk_tree(file.root(), |node| {
        if !matches!(node.kind(), "integer" | "float") {
            return true;
        }
        if COMMON_NUMBERS.contains(&file.text(node)) {
            return true;
        }
        let parent = node.parent();
        if parent.is_some_and(|p| p.kind() == "subscript") {
            return true;
        }
        if parent.is_some_and(|p| assigned_to_constant(file, p)) {
            return true;
        }
        count += 1;
        true
    });
    count
}

/// Whether the nearest enclosing assignment targets an UPPER_CASE name
fn assigned_to_constant(file: &ParsedSyntaxFile, start: Node<'_>) -> bool {
    let mut current = Some(start);
    while let Some(node) = current {
        if node.kind() == "assignment" {
            return node
                .child_by_field_name("left")
                .filter(|left| left.kind() == "identifier")
                .is_some_and(|left| upper_case().is_match(file.text(left)));
        }
        current = node.parent();
    }
    false
}

/// mypy or pyright configured for the project
fn has_type_checker(root: &Path) -> bool {
    if ["mypy.ini", ".mypy.ini", "pyrightconfig.json"]
        .iter()
        .any(|name| root.join(name).is_file())
    {
        return true;
    }
    let contains = |file: &str, needles: &[&str]| {
        std::fs::read_to_string(root.join(file))
            .map(|content| needles.iter().any(|n| content.contains(n)))
            .unwrap_or(false)
    };
    contains("setup.cfg", &["[mypy]"]) || contains("pyproject.toml", &["[tool.mypy]", "[tool.pyright]"])
}
