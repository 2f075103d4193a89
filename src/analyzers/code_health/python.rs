use super::duplication::{self, DupUnit, PYTHON_BLOCKS};
use super::{cyclomatic, LanguageHealth};
use crate::analyzers::architecture::build_python_graph;
use crate::models::{FunctionMetric, MetricSummary};
use crate::parsers::{line_span, start_line, walk_tree, ParsedSyntaxFile};
use tree_sitter::Node;

pub(super) fn analyze(files: &[ParsedSyntaxFile]) -> LanguageHealth {
    let sources: Vec<&ParsedSyntaxFile> = files.iter().filter(|f| !f.is_test()).collect();

    let mut health = LanguageHealth {
        loc: sources.iter().map(|f| f.lines).sum(),
        file_size: MetricSummary::from_values(
            sources.iter().map(|f| (f.rel_path.as_str(), f.lines)),
        ),
        ..LanguageHealth::default()
    };
    for file in &sources {
        health.functions.extend(functions(file));
    }

    let units: Vec<DupUnit<'_>> = sources
        .iter()
        .map(|f| DupUnit {
            rel_path: &f.rel_path,
            root: f.root(),
            lines: f.lines,
        })
        .collect();
    let (duplicates, rate) = duplication::detect(&units, PYTHON_BLOCKS);
    health.duplicates = duplicates;
    health.duplication_rate = rate;

    health.set_coupling(&build_python_graph(files));
    health
}

fn is_decision(node: Node<'_>) -> bool {
    matches!(
        node.kind(),
        "if_statement"
            | "elif_clause"
            | "for_statement"
            | "while_statement"
            | "except_clause"
            | "case_clause"
            | "conditional_expression"
            | "boolean_operator"
    )
}

fn is_boundary(node: Node<'_>) -> bool {
    matches!(node.kind(), "function_definition" | "class_definition")
}

/// Name of the class a method is defined in, looking through decorators
fn enclosing_class<'f>(file: &'f ParsedSyntaxFile, def: Node<'_>) -> Option<&'f str> {
    let mut parent = def.parent()?;
    if parent.kind() == "decorated_definition" {
        parent = parent.parent()?;
    }
    if parent.kind() != "block" {
        return None;
    }
    let class = parent.parent().filter(|p| p.kind() == "class_definition")?;
    class.child_by_field_name("name").map(|n| file.text(n))
}

fn functions(file: &ParsedSyntaxFile) -> Vec<FunctionMetric> {
    let mut out = Vec::new();
    walk_tree(file.root(), |node| {
        if node.kind() != "function_definition" {
            return true;
        }
        let Some(name) = node.child_by_field_name("name") else {
            return true;
        };
        let name = match enclosing_class(file, node) {
            Some(class) => format!("{}.{}", class, file.text(name)),
            None => file.text(name).to_string(),
        };
        out.push(FunctionMetric {
            name,
            file: file.rel_path.clone(),
            line: start_line(node),
            complexity: cyclomatic(node, is_decision, is_boundary),
            line_count: line_span(node),
        });
        true
    });
    out
}
