use super::duplication::{self, DupUnit, GO_BLOCKS};
use super::{binary_operator, cyclomatic, LanguageHealth};
use crate::analyzers::architecture::build_go_graph;
use crate::models::{FunctionMetric, MetricSummary};
use crate::parsers::{first_of_kind, line_span, start_line, GoFile, GoWorkspace};
use tree_sitter::Node;

pub(super) fn analyze(ws: &GoWorkspace) -> LanguageHealth {
    let files: Vec<&GoFile> = ws.source_packages().flat_map(|p| p.files.iter()).collect();

    let mut health = LanguageHealth {
        loc: files.iter().map(|f| f.lines).sum(),
        file_size: MetricSummary::from_values(files.iter().map(|f| (f.rel_path.as_str(), f.lines))),
        ..LanguageHealth::default()
    };
    for file in &files {
        health.functions.extend(functions(file));
    }

    let units: Vec<DupUnit<'_>> = files
        .iter()
        .map(|f| DupUnit {
            rel_path: &f.rel_path,
            root: f.root(),
            lines: f.lines,
        })
        .collect();
    let (duplicates, rate) = duplication::detect(&units, GO_BLOCKS);
    health.duplicates = duplicates;
    health.duplication_rate = rate;

    health.set_coupling(&build_go_graph(ws));
    health
}

fn is_decision(node: Node<'_>, source: &[u8]) -> bool {
    match node.kind() {
        "if_statement" | "for_statement" | "expression_case" | "type_case"
        | "communication_case" => true,
        "binary_expression" => matches!(binary_operator(node, source), "&&" | "||"),
        _ => false,
    }
}

/// Functions and methods with a body. Function literals count toward the
/// enclosing declaration.
fn functions(file: &GoFile) -> Vec<FunctionMetric> {
    let source = file.source.as_bytes();
    let root = file.root();
    let mut cursor = root.walk();
    let mut out = Vec::new();
    for decl in root.children(&mut cursor) {
        if !matches!(decl.kind(), "function_declaration" | "method_declaration") {
            continue;
        }
        let (Some(name), Some(_body)) = (
            decl.child_by_field_name("name"),
            decl.child_by_field_name("body"),
        ) else {
            continue;
        };
        let mut display = file.text(name).to_string();
        if decl.kind() == "method_declaration" {
            let receiver = decl
                .child_by_field_name("receiver")
                .and_then(|r| first_of_kind(r, "type_identifier"))
                .map_or("?", |t| file.text(t));
            display = format!("{}.{}", receiver, display);
        }
        out.push(FunctionMetric {
            name: display,
            file: file.rel_path.clone(),
            line: start_line(decl),
            complexity: cyclomatic(decl, |n| is_decision(n, source), |_| false),
            line_count: line_span(decl),
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::go_workspace;

    #[test]
    fn test_go_functions_and_complexity() {
        let (_dir, ws) = go_workspace(&[
            ("go.mod", "module example.com/svc\n"),
            (
                "svc.go",
                r#"package svc

type Server struct{}

func (s *Server) Handle(kind string, n int) int {
	if n > 0 && kind != "" {
		return 1
	}
	for i := 0; i < n; i++ {
		switch kind {
		case "a":
			return i
		case "b", "c":
			return -i
		default:
			return 0
		}
	}
	return 0
}

func Simple() int { return 1 }
"#,
            ),
        ]);
        let health = analyze(&ws);
        assert_eq!(health.functions.len(), 2);

        let handle = &health.functions[0];
        assert_eq!(handle.name, "Server.Handle");
        assert_eq!(handle.line, 5);
        assert_eq!(handle.line_count, 16);
        // if, &&, for, two non-default cases
        assert_eq!(handle.complexity, 6);

        let simple = &health.functions[1];
        assert_eq!(simple.name, "Simple");
        assert_eq!(simple.complexity, 1);
        assert_eq!(health.file_size.max_entity, "svc.go");
    }

    #[test]
    fn test_go_coupling_from_package_graph() {
        let (_dir, ws) = go_workspace(&[
            ("go.mod", "module m\n"),
            ("a/a.go", "package a\n\nimport \"m/c\"\n\nfunc A() { c.C() }\n"),
            ("b/b.go", "package b\n\nimport \"m/c\"\n\nfunc B() { c.C() }\n"),
            ("c/c.go", "package c\n\nfunc C() {}\n"),
        ]);
        let health = analyze(&ws);
        assert_eq!(health.afferent["m/c"], 2);
        assert_eq!(health.efferent["m/a"], 1);
        assert_eq!(health.efferent["m/c"], 0);
    }
}
