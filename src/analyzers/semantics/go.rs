use crate::analyzers::{per_kloc, percent};
use crate::models::C2LanguageMetrics;
use crate::parsers::{walk_tree, GoFile, GoWorkspace};
use tree_sitter::Node;

const COMMON_NUMBERS: &[&str] = &["0", "1", "0.0", "1.0", "2", "0x0", "0x1"];

/// Initialisms that are conventional in any case
const ACRONYMS: &[&str] = &[
    "ID", "URL", "HTTP", "HTTPS", "API", "JSON", "XML", "SQL", "HTML", "CSS", "DNS", "EOF", "IP",
    "TCP", "UDP", "TLS", "SSL", "SSH", "RPC", "CPU", "GPU", "RAM", "ROM", "OS", "IO", "DB", "UI",
    "OK",
];

#[derive(Default)]
struct Counts {
    functions: usize,
    names: usize,
    consistent_names: usize,
    magic: usize,
    type_refs: usize,
    any_refs: usize,
    pointer_uses: usize,
    checked_uses: usize,
}

/// Go is statically typed: annotation coverage and strictness are fixed at
/// their maximum.
pub(super) fn analyze(ws: &GoWorkspace) -> C2LanguageMetrics {
    let files: Vec<&GoFile> = ws.source_packages().flat_map(|p| p.files.iter()).collect();
    let loc: usize = files.iter().map(|f| f.lines).sum();

    let mut counts = Counts::default();
    for file in &files {
        scan_declarations(file, &mut counts);
        counts.magic += magic_numbers(file);
        count_nil_checks(file, &mut counts);
    }

    let any_safety = 100.0 - percent(counts.any_refs, counts.type_refs, 0.0);
    let null_safety = if counts.pointer_uses > 0 {
        let nil_safety = percent(counts.checked_uses, counts.pointer_uses, 100.0).min(100.0);
        (any_safety + nil_safety) / 2.0
    } else {
        any_safety
    };

    C2LanguageMetrics {
        type_annotation_coverage: 100.0,
        naming_consistency: percent(counts.consistent_names, counts.names, 100.0),
        magic_number_count: counts.magic,
        magic_number_ratio: per_kloc(counts.magic, loc),
        type_strictness: 1.0,
        null_safety,
        total_functions: counts.functions,
        total_identifiers: counts.names,
        loc,
    }
}

fn scan_declarations(file: &GoFile, counts: &mut Counts) {
    walk_tree(file.root(), |node| {
        match node.kind() {
            "function_declaration" | "method_declaration" => {
                counts.functions += 1;
                if let Some(name) = node.child_by_field_name("name") {
                    check_name(file.text(name), counts);
                }
            }
            "type_spec" | "type_alias" => {
                if let Some(name) = node.child_by_field_name("name") {
                    check_name(file.text(name), counts);
                }
            }
            "var_spec" | "const_spec" => {
                let mut cursor = node.walk();
                for name in node.children_by_field_name("name", &mut cursor) {
                    check_name(file.text(name), counts);
                }
            }
            "interface_type" => {
                counts.type_refs += 1;
                let mut cursor = node.walk();
                let empty = node
                    .named_children(&mut cursor)
                    .all(|c| c.kind() == "comment");
                if empty {
                    counts.any_refs += 1;
                }
            }
            "type_identifier" if file.text(node) == "any" => {
                counts.type_refs += 1;
                counts.any_refs += 1;
            }
            _ => {}
        }
        true
    });
}

fn check_name(name: &str, counts: &mut Counts) {
    if name.len() <= 1 || ACRONYMS.contains(&name) {
        return;
    }
    counts.names += 1;
    if is_conventional_name(name) {
        counts.consistent_names += 1;
    }
}

/// MixedCaps: exported names start upper case, others lower case (or `_`),
/// and underscores only appear in test helpers.
fn is_conventional_name(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return true;
    };
    if !first.is_uppercase() && !first.is_lowercase() && first != '_' {
        return false;
    }
    let rest = &name[first.len_utf8()..];
    !rest.contains('_') || name.starts_with("Test") || name.starts_with("test")
}

fn magic_numbers(file: &GoFile) -> usize {
    let mut count = 0;
    walk_tree(file.root(), |node| match node.kind() {
        "const_declaration" => false,
        "int_literal" | "float_literal" => {
            if !COMMON_NUMBERS.contains(&file.text(node)) {
                count += 1;
            }
            false
        }
        _ => true,
    });
    count
}

fn is_nil_comparison(file: &GoFile, node: Node<'_>) -> usize {
    let op = node
        .child_by_field_name("operator")
        .map_or("", |op| file.text(op));
    if op != "==" && op != "!=" {
        return 0;
    }
    ["left", "right"]
        .iter()
        .filter_map(|field| node.child_by_field_name(field))
        .filter(|side| side.kind() == "nil")
        .count()
}

/// Per function: dereferences of a named pointer and the nil comparisons
/// covering them (never more checks than dereferences)
fn count_nil_checks(file: &GoFile, counts: &mut Counts) {
    let root = file.root();
    let mut cursor = root.walk();
    for decl in root.children(&mut cursor) {
        if !matches!(decl.kind(), "function_declaration" | "method_declaration") {
            continue;
        }
        let Some(body) = decl.child_by_field_name("body") else {
            continue;
        };
        let mut checks = 0;
        let mut derefs = 0;
        walk_tree(body, |node| {
            match node.kind() {
                "binary_expression" => checks += is_nil_comparison(file, node),
                "unary_expression" => {
                    let is_deref = node
                        .child_by_field_name("operator")
                        .is_some_and(|op| file.text(op) == "*");
                    let of_name = node
                        .child_by_field_name("operand")
                        .is_some_and(|operand| operand.kind() == "identifier");
                    if is_deref && of_name {
                        derefs += 1;
                    }
                }
                _ => {}
            }
            true
        });
        counts.pointer_uses += derefs;
        counts.checked_uses += checks.min(derefs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::go_workspace;

    const SOURCE: &str = r#"package store

const retryLimit = 5

type Store struct {
	cache map[string]interface{}
}

type Reader interface {
	Read(key string) ([]byte, error)
}

var default_store = &Store{}

func (s *Store) Get(key string, fallback *int) any {
	if fallback == nil {
		return 30
	}
	return *fallback + 2
}

func ID() int { return 0 }

func Apply(n *int) int {
	return *n * 7
}
"#;

    #[test]
    fn test_go_semantics() {
        let (_dir, ws) = go_workspace(&[("go.mod", "module example.com/store\n"), ("store.go", SOURCE)]);
        let m = analyze(&ws);

        assert_eq!(m.type_annotation_coverage, 100.0);
        assert_eq!(m.type_strictness, 1.0);
        assert_eq!(m.total_functions, 3);
        assert_eq!(m.loc, 26);

        // retryLimit, Store, Reader, default_store (bad), Get, Apply; ID skipped
        assert_eq!(m.total_identifiers, 6);
        assert!((m.naming_consistency - 5.0 / 6.0 * 100.0).abs() < 1e-9);

        // 30 and 7; the const value and 2 are ignored
        assert_eq!(m.magic_number_count, 2);

        // type refs: interface{}, Reader's interface, any -> 2 of 3 unsafe
        // derefs: *fallback (checked), *n (unchecked) -> 50%
        let any_safety = 100.0 - 2.0 / 3.0 * 100.0;
        assert!((m.null_safety - (any_safety + 50.0) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_conventional_names() {
        assert!(is_conventional_name("parseConfig"));
        assert!(is_conventional_name("ParseConfig"));
        assert!(is_conventional_name("TestParse_Empty"));
        assert!(!is_conventional_name("parse_config"));
        assert!(!is_conventional_name("Parse_Config"));
    }
}
