//! Parse bridge
//!
//! Two backends sit behind this module:
//! - [`SyntaxParser`], a tree-sitter service for Python and TypeScript
//!   producing one [`ParsedSyntaxFile`] per file
//! - [`GoLoader`], the Go frontend that groups files into packages, builds
//!   package-scope symbol tables and resolves cross-package uses

pub mod go;
mod pool;

pub use go::{
    first_of_kind, GoFile, GoImport, GoLoader, GoPackage, GoSymbol, GoWorkspace, ImportName,
    SymbolKind,
};
pub use pool::{Grammar, SyntaxParser};

use crate::models::{FileRole, Language};
use thiserror::Error;
use tree_sitter::{Node, Tree};

/// Errors raised while turning source text into syntax trees
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to load {grammar} grammar: {source}")]
    Grammar {
        grammar: &'static str,
        #[source]
        source: tree_sitter::LanguageError,
    },

    #[error("Invalid query: {0}")]
    Query(#[from] tree_sitter::QueryError),

    #[error("Parser produced no tree for {0}")]
    NoTree(String),

    #[error("Parser lock poisoned")]
    Poisoned,
}

/// A Python or TypeScript file together with its syntax tree.
///
/// The tree's native memory is released when this value is dropped.
pub struct ParsedSyntaxFile {
    pub rel_path: String,
    pub language: Language,
    pub role: FileRole,
    pub lines: usize,
    pub source: String,
    pub tree: Tree,
}

impl ParsedSyntaxFile {
    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    pub fn bytes(&self) -> &[u8] {
        self.source.as_bytes()
    }

    pub fn text(&self, node: Node<'_>) -> &str {
        node_text(node, self.source.as_bytes())
    }

    pub fn is_test(&self) -> bool {
        self.role == FileRole::Test
    }
}

impl std::fmt::Debug for ParsedSyntaxFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedSyntaxFile")
            .field("rel_path", &self.rel_path)
            .field("language", &self.language)
            .field("role", &self.role)
            .field("lines", &self.lines)
            .finish()
    }
}

/// Text of a node, empty when the byte range is not valid UTF-8
pub fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// 1-based line a node starts on
pub fn start_line(node: Node<'_>) -> usize {
    node.start_position().row + 1
}

/// Number of lines a node spans
pub fn line_span(node: Node<'_>) -> usize {
    node.end_position().row - node.start_position().row + 1
}

/// Pre-order traversal. Children of a node are visited only when `visit`
/// returns `true` for it.
pub fn walk_tree<'t, F>(root: Node<'t>, mut visit: F)
where
    F: FnMut(Node<'t>) -> bool,
{
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if visit(node) {
            let mut cursor = node.walk();
            let children: Vec<Node<'t>> = node.children(&mut cursor).collect();
            stack.extend(children.into_iter().rev());
        }
    }
}

/// Line count as reported everywhere in the crate
pub fn count_lines(content: &str) -> usize {
    content.lines().count()
}
