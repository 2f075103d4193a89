//! Tree-sitter parsing service for Python and TypeScript
//!
//! A tree-sitter `Parser` cannot be driven from two threads at once, so the
//! service owns one parser per grammar variant behind a single mutex. Callers
//! share the service by reference; the lock is held only for the parse call.

use super::{count_lines, ParseError, ParsedSyntaxFile};
use crate::models::{AnalysisTarget, Language, SourceFile};
use std::sync::Mutex;
use tracing::{debug, warn};
use tree_sitter::{Parser, Tree};

/// Grammar variants served by [`SyntaxParser`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grammar {
    Python,
    TypeScript,
    /// TypeScript with embedded JSX markup
    Tsx,
}

impl Grammar {
    /// Pick the grammar for a file, `None` for languages parsed elsewhere
    pub fn for_file(language: Language, rel_path: &str) -> Option<Grammar> {
        match language {
            Language::Python => Some(Grammar::Python),
            Language::TypeScript if rel_path.ends_with(".tsx") => Some(Grammar::Tsx),
            Language::TypeScript => Some(Grammar::TypeScript),
            Language::Go => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Grammar::Python => "Python",
            Grammar::TypeScript => "TypeScript",
            Grammar::Tsx => "TSX",
        }
    }
}

struct Parsers {
    python: Parser,
    typescript: Parser,
    tsx: Parser,
}

impl Parsers {
    fn get(&mut self, grammar: Grammar) -> &mut Parser {
        match grammar {
            Grammar::Python => &mut self.python,
            Grammar::TypeScript => &mut self.typescript,
            Grammar::Tsx => &mut self.tsx,
        }
    }
}

/// Shared parsing service. Create with [`SyntaxParser::new`], release with
/// [`SyntaxParser::close`].
pub struct SyntaxParser {
    parsers: Mutex<Parsers>,
}

fn make_parser(
    grammar: Grammar,
    language: tree_sitter::Language,
) -> Result<Parser, ParseError> {
    let mut parser = Parser::new();
    parser
        .set_language(&language)
        .map_err(|source| ParseError::Grammar {
            grammar: grammar.name(),
            source,
        })?;
    Ok(parser)
}

impl SyntaxParser {
    pub fn new() -> Result<Self, ParseError> {
        let parsers = Parsers {
            python: make_parser(Grammar::Python, tree_sitter_python::LANGUAGE.into())?,
            typescript: make_parser(
                Grammar::TypeScript,
                tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            )?,
            tsx: make_parser(Grammar::Tsx, tree_sitter_typescript::LANGUAGE_TSX.into())?,
        };
        debug!("Syntax parser service created");
        Ok(Self {
            parsers: Mutex::new(parsers),
        })
    }

    /// Parse source text with one grammar
    pub fn parse(&self, grammar: Grammar, source: &str, label: &str) -> Result<Tree, ParseError> {
        let mut parsers = self.parsers.lock().map_err(|_| ParseError::Poisoned)?;
        parsers
            .get(grammar)
            .parse(source, None)
            .ok_or_else(|| ParseError::NoTree(label.to_string()))
    }

    /// Parse one file of a target
    pub fn parse_file(&self, file: &SourceFile) -> Result<Option<ParsedSyntaxFile>, ParseError> {
        let Some(grammar) = Grammar::for_file(file.language, &file.rel_path) else {
            return Ok(None);
        };
        let tree = self.parse(grammar, &file.content, &file.rel_path)?;
        if tree.root_node().has_error() {
            debug!("{} parsed with syntax errors", file.rel_path);
        }
        Ok(Some(ParsedSyntaxFile {
            rel_path: file.rel_path.clone(),
            language: file.language,
            role: file.role,
            lines: if file.lines > 0 {
                file.lines
            } else {
                count_lines(&file.content)
            },
            source: file.content.clone(),
            tree,
        }))
    }

    /// Parse every file of a target. Files that fail are logged and left out.
    pub fn parse_target(&self, target: &AnalysisTarget) -> Vec<ParsedSyntaxFile> {
        if target.language() == Language::Go {
            debug!("Go targets are loaded by the package loader");
            return Vec::new();
        }
        let mut parsed = Vec::with_capacity(target.files().len());
        for file in target.files() {
            match self.parse_file(file) {
                Ok(Some(p)) => parsed.push(p),
                Ok(None) => {}
                Err(e) => warn!("Skipping {}: {}", file.rel_path, e),
            }
        }
        debug!(
            "Parsed {}/{} {} files",
            parsed.len(),
            target.files().len(),
            target.language()
        );
        parsed
    }

    /// Release the parsers
    pub fn close(self) {
        drop(self);
        debug!("Syntax parser service closed");
    }
}
