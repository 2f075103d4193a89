use super::duplication::{self, DupUnit, TYPESCRIPT_BLOCKS};
use super::{binary_operator, cyclomatic, LanguageHealth};
use crate::analyzers::architecture::build_typescript_graph;
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
    let (duplicates, rate) = duplication::detect(&units, TYPESCRIPT_BLOCKS);
    health.duplicates = duplicates;
    health.duplication_rate = rate;

    health.set_coupling(&build_typescript_graph(files));
    health
}

const FUNCTION_KINDS: &[&str] = &[
    "function_declaration",
    "generator_function_declaration",
    "function_expression",
    "arrow_function",
    "method_definition",
];

fn is_decision(node: Node<'_>, source: &[u8]) -> bool {
    match node.kind() {
        "if_statement" | "for_statement" | "for_in_statement" | "while_statement"
        | "do_statement" | "switch_case" | "catch_clause" | "ternary_expression" => true,
        "binary_expression" => matches!(binary_operator(node, source), "&&" | "||" | "??"),
        _ => false,
    }
}

fn is_boundary(node: Node<'_>) -> bool {
    FUNCTION_KINDS.contains(&node.kind()) || node.kind() == "class_declaration"
}

/// Display name of a function-like node, `None` for anonymous callbacks
fn function_name(file: &ParsedSyntaxFile, node: Node<'_>) -> Option<String> {
    match node.kind() {
        "function_declaration" | "generator_function_declaration" => node
            .child_by_field_name("name")
            .map(|n| file.text(n).to_string()),
        "method_definition" => {
            let method = file.text(node.child_by_field_name("name")?);
            let class = node
                .parent()
                .filter(|p| p.kind() == "class_body")
                .and_then(|body| body.parent())
                .and_then(|class| class.child_by_field_name("name"))
                .map(|n| file.text(n));
            Some(match class {
                Some(class) => format!("{}.{}", class, method),
                None => method.to_string(),
            })
        }
        "arrow_function" | "function_expression" => {
            let declarator = node.parent().filter(|p| p.kind() == "variable_declarator")?;
            declarator
                .child_by_field_name("name")
                .map(|n| file.text(n).to_string())
        }
        _ => None,
    }
}

fn functions(file: &ParsedSyntaxFile) -> Vec<FunctionMetric> {
    let source = file.bytes();
    let mut out = Vec::new();
    walk_tree(file.root(), |node| {
        if !FUNCTION_KINDS.contains(&node.kind()) {
            return true;
        }
        if let Some(name) = function_name(file, node) {
            out.push(FunctionMetric {
                name,
                file: file.rel_path.clone(),
                line: start_line(node),
                complexity: cyclomatic(node, |n| is_decision(n, source), is_boundary),
                line_count: line_span(node),
            });
        }
        true
    });
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::parse_files;
    use crate::models::Language;

    const SOURCE: &str = r#"export function route(req: Request): string {
  if (!req.path || req.path === "/") {
    return "home";
  }
  switch (req.method) {
    case "GET":
      return "get";
    case "POST":
      return "post";
    default:
      return req.fallback ?? "none";
  }
}

export class Store {
  load(id: string) {
    try {
      return this.cache[id] ? this.cache[id] : fetch(id);
    } catch (e) {
      return null;
    }
  }
}

export const double = (n: number) => n * 2;

[1, 2].map((x) => x > 1 && x < 5);
"#;

    #[test]
    fn test_typescript_functions_and_complexity() {
        let files = parse_files(Language::TypeScript, &[("src/route.ts", SOURCE)]);
        let health = analyze(&files);
        let names: Vec<&str> = health.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["route", "Store.load", "double"]);

        // if, ||, two cases, ??
        assert_eq!(health.functions[0].complexity, 6);
        assert_eq!(health.functions[0].line_count, 13);
        // ternary, catch
        assert_eq!(health.functions[1].complexity, 3);
        assert_eq!(health.functions[2].complexity, 1);
    }

    #[test]
    fn test_tsx_file_is_measured() {
        let files = parse_files(
            Language::TypeScript,
            &[(
                "src/App.tsx",
                "export function App({ on }: { on: boolean }) {\n  return on ? <b>on</b> : <i>off</i>;\n}\n",
            )],
        );
        let health = analyze(&files);
        assert_eq!(health.functions.len(), 1);
        assert_eq!(health.functions[0].complexity, 2);
    }
}
