use crate::analyzers::{per_kloc, percent};
use crate::models::C2LanguageMetrics;
use crate::parsers::{walk_tree, ParsedSyntaxFile};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;
use tree_sitter::Node;

const COMMON_NUMBERS: &[&str] = &["0", "1", "-1", "0.0", "1.0"];
const STRICT_NULL_POINTS: f64 = 50.0;
const CHAIN_DENSITY_SCALE: f64 = 10.0;
const MAX_CHAIN_POINTS: f64 = 50.0;

fn camel_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("valid regex"))
}

fn pascal_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][a-zA-Z0-9]*$").expect("valid regex"))
}

fn upper_snake_case() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]*(_[A-Z0-9]+)*$").expect("valid regex"))
}

#[derive(Default)]
struct Counts {
    slots: usize,
    typed: usize,
    any: usize,
    functions: usize,
    names: usize,
    consistent_names: usize,
    magic: usize,
    optional_chains: usize,
}

pub(super) fn analyze(files: &[ParsedSyntaxFile], root: &Path) -> C2LanguageMetrics {
    let sources: Vec<&ParsedSyntaxFile> = files.iter().filter(|f| !f.is_test()).collect();
    let loc: usize = sources.iter().map(|f| f.lines).sum();

    let mut counts = Counts::default();
    for file in &sources {
        scan(file, &mut counts);
    }

    let strictness = Strictness::detect(root);
    let mut null_safety = 0.0;
    if strictness.null_checks {
        null_safety += STRICT_NULL_POINTS;
    }
    null_safety += (per_kloc(counts.optional_chains, loc) * CHAIN_DENSITY_SCALE).min(MAX_CHAIN_POINTS);

    C2LanguageMetrics {
        type_annotation_coverage: percent(counts.typed.saturating_sub(counts.any), counts.slots, 0.0),
        naming_consistency: percent(counts.consistent_names, counts.names, 100.0),
        magic_number_count: counts.magic,
        magic_number_ratio: per_kloc(counts.magic, loc),
        type_strictness: if strictness.strict { 1.0 } else { 0.0 },
        null_safety,
        total_functions: counts.functions,
        total_identifiers: counts.names,
        loc,
    }
}

fn scan(file: &ParsedSyntaxFile, counts: &mut Counts) {
    walk_tree(file.root(), |node| {
        match node.kind() {
            "function_declaration" | "generator_function_declaration" | "method_definition" => {
                count_signature(file, node, counts);
                if let Some(name) = node.child_by_field_name("name") {
                    check_name(file.text(name), NameKind::Function, counts);
                }
            }
            "arrow_function" | "function_expression" => count_signature(file, node, counts),
            "class_declaration" | "abstract_class_declaration" | "interface_declaration"
            | "type_alias_declaration" | "enum_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    check_name(file.text(name), NameKind::Type, counts);
                }
            }
            "variable_declarator" => {
                let name = node
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier");
                if let Some(name) = name {
                    let kind = if in_const_declaration(file, node) {
                        NameKind::Constant
                    } else {
                        NameKind::Variable
                    };
                    check_name(file.text(name), kind, counts);
                }
            }
            "number" => {
                if !COMMON_NUMBERS.contains(&file.text(node)) && !in_constant_context(file, node) {
                    counts.magic += 1;
                }
            }
            "optional_chain" => counts.optional_chains += 1,
            _ => {}
        }
        true
    });
}

/// One slot for the return type and one per parameter
fn count_signature(file: &ParsedSyntaxFile, function: Node<'_>, counts: &mut Counts) {
    counts.functions += 1;
    let mut slot = |annotation: Option<Node<'_>>| {
        counts.slots += 1;
        if let Some(annotation) = annotation {
            counts.typed += 1;
            if uses_any(file, annotation) {
                counts.any += 1;
            }
        }
    };

    slot(function.child_by_field_name("return_type"));
    if let Some(params) = function.child_by_field_name("parameters") {
        let mut cursor = params.walk();
        for param in params.named_children(&mut cursor) {
            if matches!(
                param.kind(),
                "required_parameter" | "optional_parameter" | "rest_parameter"
            ) {
                slot(param.child_by_field_name("type"));
            }
        }
    } else if function.child_by_field_name("parameter").is_some() {
        // `x => ...` can never carry an annotation
        slot(None);
    }
}

fn uses_any(file: &ParsedSyntaxFile, annotation: Node<'_>) -> bool {
    let mut found = false;
    walk_tree(annotation, |node| {
        if node.kind() == "predefined_type" && file.text(node) == "any" {
            found = true;
        }
        !found
    });
    found
}

#[derive(Clone, Copy)]
enum NameKind {
    Function,
    Variable,
    Constant,
    Type,
}

fn check_name(name: &str, kind: NameKind, counts: &mut Counts) {
    let name = name.trim_start_matches(['_', '$']);
    if name.len() <= 1 {
        return;
    }
    counts.names += 1;
    let consistent = match kind {
        NameKind::Function | NameKind::Variable => camel_case().is_match(name),
        NameKind::Constant => camel_case().is_match(name) || upper_snake_case().is_match(name),
        NameKind::Type => pascal_case().is_match(name),
    };
    if consistent {
        counts.consistent_names += 1;
    }
}

fn is_const_declaration(file: &ParsedSyntaxFile, node: Node<'_>) -> bool {
    node.kind() == "lexical_declaration"
        && node
            .child(0)
            .is_some_and(|keyword| file.text(keyword) == "const")
}

fn in_const_declaration(file: &ParsedSyntaxFile, declarator: Node<'_>) -> bool {
    declarator
        .parent()
        .is_some_and(|decl| is_const_declaration(file, decl))
}

/// Inside a `const` declaration or an enum
fn in_constant_context(file: &ParsedSyntaxFile, node: Node<'_>) -> bool {
    let mut current = node.parent();
    while let Some(ancestor) = current {
        if is_const_declaration(file, ancestor)
            || matches!(ancestor.kind(), "enum_body" | "enum_declaration")
        {
            return true;
        }
        current = ancestor.parent();
    }
    false
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompilerOptions {
    strict: Option<bool>,
    strict_null_checks: Option<bool>,
    no_implicit_any: Option<bool>,
    strict_function_types: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TsConfig {
    #[serde(default)]
    compiler_options: CompilerOptions,
}

#[derive(Debug, Default, PartialEq)]
struct Strictness {
    strict: bool,
    null_checks: bool,
}

impl Strictness {
    fn detect(root: &Path) -> Self {
        let Ok(raw) = std::fs::read_to_string(root.join("tsconfig.json")) else {
            return Self::default();
        };
        match serde_json::from_str::<TsConfig>(&strip_json_comments(&raw)) {
            Ok(config) => Self::from_options(&config.compiler_options),
            Err(e) => {
                debug!("Unreadable tsconfig.json: {}", e);
                Self::default()
            }
        }
    }

    fn from_options(opts: &CompilerOptions) -> Self {
        if opts.strict == Some(true) {
            return Self {
                strict: true,
                null_checks: true,
            };
        }
        let null_checks = opts.strict_null_checks == Some(true);
        Self {
            strict: null_checks
                && opts.no_implicit_any == Some(true)
                && opts.strict_function_types == Some(true),
            null_checks,
        }
    }
}

/// Drop `//` and `/* */` comments and trailing commas outside of strings
fn strip_json_comments(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    let mut in_string = false;
    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }
    strip_trailing_commas(&out)
}

fn strip_trailing_commas(json: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));
    re.replace_all(json, "$1").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::{parse_files, write_files};
    use crate::models::Language;

    const SOURCE: &str = r#"export const MAX_RETRIES = 5;
enum Level { Low = 10, High = 20 }

export interface user_record {
  id: string;
}

export function loadUser(id: string, opts?: any): Promise<string> {
  return fetch(id, 3000)?.then((r) => r.name);
}

let Counter = 0;

export class Cache {
  get(key: string) {
    return this.map?.get(key) ?? 42;
  }
}
"#;

    #[test]
    fn test_typescript_semantics() {
        let files = parse_files(Language::TypeScript, &[("src/user.ts", SOURCE)]);
        let dir = tempfile::tempdir().expect("tempdir");
        let m = analyze(&files, dir.path());

        // loadUser: return, id, opts(any); arrow: return, r; get: return, key
        assert_eq!(m.total_functions, 3);
        assert!((m.type_annotation_coverage - 3.0 / 7.0 * 100.0).abs() < 1e-9);

        // MAX_RETRIES, Level, user_record (bad), loadUser, Counter (bad), Cache, get
        assert_eq!(m.total_identifiers, 7);
        assert!((m.naming_consistency - 5.0 / 7.0 * 100.0).abs() < 1e-9);

        // 3000 and 42; const and enum values are named
        assert_eq!(m.magic_number_count, 2);
        assert_eq!(m.type_strictness, 0.0);
        // two optional chains over 18 lines, capped at 50
        assert_eq!(m.null_safety, 50.0);
    }

    #[test]
    fn test_strictness_from_tsconfig_with_comments() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_files(
            dir.path(),
            &[(
                "tsconfig.json",
                "{\n  // compiler settings\n  \"compilerOptions\": {\n    /* all on */\n    \"strict\": true,\n    \"outDir\": \"dist//x\",\n  },\n}\n",
            )],
        );
        assert_eq!(
            Strictness::detect(dir.path()),
            Strictness {
                strict: true,
                null_checks: true
            }
        );
    }

    #[test]
    fn test_partial_strict_flags() {
        let opts = CompilerOptions {
            strict_null_checks: Some(true),
            no_implicit_any: Some(true),
            ..Default::default()
        };
        assert_eq!(
            Strictness::from_options(&opts),
            Strictness {
                strict: false,
                null_checks: true
            }
        );
        assert_eq!(Strictness::detect(Path::new("/nonexistent")), Strictness::default());
    }
}
