//! Go package loader
//!
//! Loads every Go file of a target, groups files into packages by directory
//! (`_test.go` files form the test variant of their package), detects the
//! module path from `go.mod` and builds package-scope symbol tables and
//! per-file import alias tables. Cross-package uses are resolved from
//! selector expressions and qualified types whose operand names an import.

use super::{count_lines, node_text, start_line, walk_tree, ParseError};
use crate::models::{AnalysisTarget, FileRole};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

/// How an import binds its package name in the importing file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    /// No explicit name: the imported package's declared name
    Default,
    Named(String),
    /// `import _ "x"`
    Blank,
    /// `import . "x"`
    Dot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoImport {
    pub path: String,
    pub name: ImportName,
    pub line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Func,
    Method,
    Type,
    Var,
    Const,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Func => "func",
            SymbolKind::Method => "method",
            SymbolKind::Type => "type",
            SymbolKind::Var => "var",
            SymbolKind::Const => "const",
        }
    }
}

/// A package-scope declaration (methods are recorded with their receiver)
#[derive(Debug, Clone, PartialEq)]
pub struct GoSymbol {
    pub name: String,
    pub kind: SymbolKind,
    pub exported: bool,
    pub file: String,
    pub line: usize,
    pub receiver: Option<String>,
}

/// One parsed Go file
pub struct GoFile {
    pub path: PathBuf,
    pub rel_path: String,
    pub source: String,
    pub tree: Tree,
    pub lines: usize,
    pub package_name: String,
    pub imports: Vec<GoImport>,
    pub is_test: bool,
}

impl GoFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.source.as_bytes())
    }
}

impl std::fmt::Debug for GoFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoFile")
            .field("rel_path", &self.rel_path)
            .field("package_name", &self.package_name)
            .field("imports", &self.imports)
            .finish()
    }
}

/// A Go package, or the test variant of one
#[derive(Debug)]
pub struct GoPackage {
    /// Import path
    pub path: String,
    /// Declared package name
    pub name: String,
    /// Directory relative to the project root (`""` for the root)
    pub dir: String,
    /// Set to the tested package's path for test variants
    pub for_test: Option<String>,
    pub files: Vec<GoFile>,
    pub imports: BTreeSet<String>,
    pub symbols: Vec<GoSymbol>,
}

impl GoPackage {
    pub fn lines(&self) -> usize {
        self.files.iter().map(|f| f.lines).sum()
    }
}

/// All packages of a Go target, linked by module path
#[derive(Debug)]
pub struct GoWorkspace {
    pub module_path: String,
    /// Directory holding `go.mod`, `None` when the module path is a fallback
    pub module_dir: Option<PathBuf>,
    pub packages: Vec<GoPackage>,
}

impl GoWorkspace {
    pub fn source_packages(&self) -> impl Iterator<Item = &GoPackage> {
        self.packages.iter().filter(|p| p.for_test.is_none())
    }

    pub fn test_packages(&self) -> impl Iterator<Item = &GoPackage> {
        self.packages.iter().filter(|p| p.for_test.is_some())
    }

    pub fn package(&self, path: &str) -> Option<&GoPackage> {
        self.source_packages().find(|p| p.path == path)
    }

    pub fn is_intra_module(&self, import_path: &str) -> bool {
        import_path == self.module_path
            || import_path
                .strip_prefix(self.module_path.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Import path relative to the module; `Some("")` for the module root package
    pub fn module_relative<'a>(&self, import_path: &'a str) -> Option<&'a str> {
        if import_path == self.module_path {
            return Some("");
        }
        import_path
            .strip_prefix(self.module_path.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
    }

    /// Name an import binds when it has no explicit alias
    fn default_import_name(&self, import_path: &str) -> String {
        if let Some(pkg) = self.package(import_path) {
            return pkg.name.clone();
        }
        guess_package_name(import_path)
    }

    /// Local name -> import path for one file, plus its dot imports
    pub fn file_aliases(&self, file: &GoFile) -> (HashMap<String, String>, Vec<String>) {
        let mut aliases = HashMap::new();
        let mut dots = Vec::new();
        for import in &file.imports {
            match &import.name {
                ImportName::Blank => {}
                ImportName::Dot => dots.push(import.path.clone()),
                ImportName::Named(alias) => {
                    aliases.insert(alias.clone(), import.path.clone());
                }
                ImportName::Default => {
                    aliases.insert(self.default_import_name(&import.path), import.path.clone());
                }
            }
        }
        (aliases, dots)
    }

    /// `(package path, name)` pairs referenced by source packages from outside
    /// the declaring package
    pub fn cross_package_uses(&self) -> HashSet<(String, String)> {
        let mut uses = HashSet::new();
        for pkg in self.source_packages() {
            for file in &pkg.files {
                self.collect_file_uses(pkg, file, &mut uses);
            }
        }
        uses
    }

    fn collect_file_uses(
        &self,
        pkg: &GoPackage,
        file: &GoFile,
        uses: &mut HashSet<(String, String)>,
    ) {
        let (aliases, dots) = self.file_aliases(file);
        let dot_exports: HashMap<&str, &str> = dots
            .iter()
            .filter_map(|path| self.package(path))
            .flat_map(|dp| {
                dp.symbols
                    .iter()
                    .filter(|s| s.exported && s.kind != SymbolKind::Method)
                    .map(move |s| (s.name.as_str(), dp.path.as_str()))
            })
            .collect();

        walk_tree(file.root(), |node| {
            let (operand, member) = match node.kind() {
                "selector_expression" => (
                    node.child_by_field_name("operand"),
                    node.child_by_field_name("field"),
                ),
                "qualified_type" => (
                    node.child_by_field_name("package"),
                    node.child_by_field_name("name"),
                ),
                "identifier" | "type_identifier" if !dot_exports.is_empty() => {
                    if let Some(path) = dot_exports.get(file.text(node)) {
                        uses.insert((path.to_string(), file.text(node).to_string()));
                    }
                    return true;
                }
                _ => return true,
            };
            if let (Some(operand), Some(member)) = (operand, member) {
                if matches!(operand.kind(), "identifier" | "package_identifier") {
                    if let Some(path) = aliases.get(file.text(operand)) {
                        if *path != pkg.path {
                            uses.insert((path.clone(), file.text(member).to_string()));
                        }
                    }
                }
            }
            true
        });
    }
}

/// Best guess at a package name from its import path (`gopkg.in/yaml.v3` -> `yaml`,
/// `example.com/x/v2` -> `x`)
fn guess_package_name(import_path: &str) -> String {
    let segments: Vec<&str> = import_path.split('/').collect();
    let mut last = segments.last().copied().unwrap_or(import_path);
    let is_major_version =
        |s: &str| s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit());
    if is_major_version(last) && segments.len() > 1 {
        last = segments[segments.len() - 2];
    }
    if let Some((base, suffix)) = last.rsplit_once('.') {
        if is_major_version(suffix) {
            last = base;
        }
    }
    last.to_string()
}

fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Walk upward from `start` looking for `go.mod`; returns (module path, module dir)
pub fn find_module(start: &Path) -> Option<(String, PathBuf)> {
    start.ancestors().find_map(|d| read_module(d).map(|m| (m, d.to_path_buf())))
}

/// Module path declared by `dir/go.mod`, if any
fn read_module(dir: &Path) -> Option<String> {
    let go_mod = dir.join("go.mod");
    let content = std::fs::read_to_string(&go_mod).ok()?;
    let module = content.lines().find_map(|line| {
        line.trim()
            .strip_prefix("module ")
            .map(|m| m.trim().trim_matches('"').to_string())
    });
    match module {
        Some(m) if !m.is_empty() => Some(m),
        _ => {
            debug!("{} has no module line", go_mod.display());
            None
        }
    }
}

const IMPORT_QUERY: &str = r#"
    (import_spec
        name: (_)? @import_name
        path: (_) @import_path
    ) @import
"#;

/// Loads Go targets into a [`GoWorkspace`]
pub struct GoLoader {
    parser: Parser,
    import_query: Query,
}

impl GoLoader {
    pub fn new() -> Result<Self, ParseError> {
        let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|source| ParseError::Grammar {
                grammar: "Go",
                source,
            })?;
        let import_query = Query::new(&language, IMPORT_QUERY)?;
        Ok(Self {
            parser,
            import_query,
        })
    }

    /// Parse a Go file from memory
    pub fn parse_source(
        &mut self,
        source: String,
        path: &Path,
        rel_path: &str,
        is_test: bool,
    ) -> Result<GoFile, ParseError> {
        let tree = self
            .parser
            .parse(&source, None)
            .ok_or_else(|| ParseError::NoTree(rel_path.to_string()))?;
        if tree.root_node().has_error() {
            debug!("{} parsed with syntax errors", rel_path);
        }
        let package_name = package_name(tree.root_node(), source.as_bytes());
        let imports = self.extract_imports(tree.root_node(), source.as_bytes());
        Ok(GoFile {
            path: path.to_path_buf(),
            rel_path: rel_path.to_string(),
            lines: count_lines(&source),
            source,
            tree,
            package_name,
            imports,
            is_test,
        })
    }

    fn extract_imports(&self, root: Node<'_>, source: &[u8]) -> Vec<GoImport> {
        let mut imports = Vec::new();
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&self.import_query, root, source);
        while let Some(m) = matches.next() {
            let mut path = String::new();
            let mut name = ImportName::Default;
            let mut line = 0;
            for capture in m.captures.iter() {
                let capture_name = self.import_query.capture_names()[capture.index as usize];
                match capture_name {
                    "import" => line = start_line(capture.node),
                    "import_path" => {
                        path = node_text(capture.node, source)
                            .trim_matches(|c| c == '"' || c == '`')
                            .to_string();
                    }
                    "import_name" => {
                        name = match capture.node.kind() {
                            "dot" => ImportName::Dot,
                            "blank_identifier" => ImportName::Blank,
                            _ => ImportName::Named(node_text(capture.node, source).to_string()),
                        };
                    }
                    _ => {}
                }
            }
            if !path.is_empty() {
                imports.push(GoImport { path, name, line });
            }
        }
        imports
    }

    /// Load every Go file of the target. Unreadable or unparsable files are
    /// logged and skipped.
    pub fn load(&mut self, target: &AnalysisTarget) -> GoWorkspace {
        let mut groups: BTreeMap<(String, bool), Vec<GoFile>> = BTreeMap::new();
        for file in target.files() {
            let is_test = file.role == FileRole::Test;
            let source = match std::fs::read_to_string(&file.path) {
                Ok(s) => s,
                Err(e) => {
                    warn!("Skipping {}: {}", file.rel_path, e);
                    continue;
                }
            };
            match self.parse_source(source, &file.path, &file.rel_path, is_test) {
                Ok(parsed) => {
                    let dir = match file.rel_path.rsplit_once('/') {
                        Some((dir, _)) => dir.to_string(),
                        None => String::new(),
                    };
                    groups.entry((dir, is_test)).or_default().push(parsed);
                }
                Err(e) => warn!("Skipping {}: {}", file.rel_path, e),
            }
        }

        // the root's own go.mod wins over nested modules
        let module = read_module(&target.root)
            .map(|m| (m, target.root.clone()))
            .or_else(|| {
                let start = target
                    .files()
                    .first()
                    .and_then(|f| f.path.parent())
                    .unwrap_or(target.root.as_path());
                find_module(start)
            });
        let (module_path, module_dir) = match module {
            Some((path, dir)) => (path, Some(dir)),
            None => {
                let fallback = target
                    .root
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("main")
                    .to_string();
                debug!("No go.mod found, using '{}' as module path", fallback);
                (fallback, None)
            }
        };

        let packages: Vec<GoPackage> = groups
            .into_iter()
            .map(|((dir, is_test), files)| {
                let path =
                    package_import_path(&target.root, &dir, &module_path, module_dir.as_deref());
                build_package(path, dir, is_test, files)
            })
            .collect();

        info!(
            "Loaded {} Go packages for module {}",
            packages.len(),
            module_path
        );
        GoWorkspace {
            module_path,
            module_dir,
            packages,
        }
    }
}

fn package_name(root: Node<'_>, source: &[u8]) -> String {
    let mut cursor = root.walk();
    for child in root.children(&mut cursor) {
        if child.kind() == "package_clause" {
            let mut inner = child.walk();
            for part in child.children(&mut inner) {
                if part.kind() == "package_identifier" {
                    return node_text(part, source).to_string();
                }
            }
        }
    }
    String::new()
}

fn package_import_path(
    root: &Path,
    dir: &str,
    module_path: &str,
    module_dir: Option<&Path>,
) -> String {
    let relative = match module_dir {
        Some(module_dir) => {
            let abs = if dir.is_empty() {
                root.to_path_buf()
            } else {
                root.join(dir)
            };
            match abs.strip_prefix(module_dir) {
                Ok(rel) => rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/"),
                Err(_) => dir.to_string(),
            }
        }
        None => dir.to_string(),
    };
    if relative.is_empty() {
        module_path.to_string()
    } else {
        format!("{}/{}", module_path, relative)
    }
}

fn build_package(path: String, dir: String, is_test: bool, files: Vec<GoFile>) -> GoPackage {
    let name = files
        .iter()
        .map(|f| f.package_name.as_str())
        .find(|n| !n.is_empty())
        .unwrap_or("")
        .to_string();
    let imports = files
        .iter()
        .flat_map(|f| f.imports.iter().map(|i| i.path.clone()))
        .collect();
    let symbols = files.iter().flat_map(collect_symbols).collect();
    GoPackage {
        for_test: is_test.then(|| path.clone()),
        path,
        name,
        dir,
        files,
        imports,
        symbols,
    }
}

fn collect_symbols(file: &GoFile) -> Vec<GoSymbol> {
    let mut symbols = Vec::new();
    let mut push = |name: &str, kind: SymbolKind, node: Node<'_>, receiver: Option<String>| {
        if name.is_empty() || name == "_" {
            return;
        }
        symbols.push(GoSymbol {
            name: name.to_string(),
            kind,
            exported: is_exported(name),
            file: file.rel_path.clone(),
            line: start_line(node),
            receiver,
        });
    };

    let root = file.root();
    let mut cursor = root.walk();
    for decl in root.children(&mut cursor) {
        match decl.kind() {
            "function_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    push(file.text(name), SymbolKind::Func, decl, None);
                }
            }
            "method_declaration" => {
                if let Some(name) = decl.child_by_field_name("name") {
                    let receiver = decl
                        .child_by_field_name("receiver")
                        .and_then(|r| first_of_kind(r, "type_identifier"))
                        .map(|t| file.text(t).to_string());
                    push(file.text(name), SymbolKind::Method, decl, receiver);
                }
            }
            "type_declaration" | "var_declaration" | "const_declaration" => {
                let (spec_kind, kind) = match decl.kind() {
                    "type_declaration" => ("type_spec", SymbolKind::Type),
                    "var_declaration" => ("var_spec", SymbolKind::Var),
                    _ => ("const_spec", SymbolKind::Const),
                };
                walk_tree(decl, |node| {
                    if node.kind() == spec_kind || node.kind() == "type_alias" {
                        let mut names = node.walk();
                        for name in node.children_by_field_name("name", &mut names) {
                            push(file.text(name), kind, node, None);
                        }
                        return false;
                    }
                    true
                });
            }
            _ => {}
        }
    }
    symbols
}

/// First descendant (pre-order) of the given kind
pub fn first_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut found = None;
    walk_tree(node, |n| {
        if found.is_some() {
            return false;
        }
        if n.kind() == kind {
            found = Some(n);
            return false;
        }
        true
    });
    found
}
