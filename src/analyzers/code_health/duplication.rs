//! Structural duplicate detection
//!
//! Inside every block-like node, each run of at least [`MIN_STATEMENTS`]
//! consecutive statements spanning at least [`MIN_LINES`] lines is hashed by
//! shape (node kinds, child counts and a few markers, never identifiers or
//! literals). Runs sharing a hash are reported pairwise.

use crate::models::DuplicateBlock;
use crate::parsers::walk_tree;
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};
use tree_sitter::Node;
use xxhash_rust::xxh3::Xxh3;

const MIN_STATEMENTS: usize = 3;
const MIN_LINES: usize = 6;
const MAX_HASH_DEPTH: usize = 5;
const MAX_HASH_CHILDREN: usize = 10;

/// Statement containers per language
pub(crate) const PYTHON_BLOCKS: &[&str] = &["block", "module"];
pub(crate) const TYPESCRIPT_BLOCKS: &[&str] = &["statement_block", "program"];
pub(crate) const GO_BLOCKS: &[&str] = &["block", "statement_list"];

/// One file handed to the detector
pub(crate) struct DupUnit<'a> {
    pub rel_path: &'a str,
    pub root: Node<'a>,
    pub lines: usize,
}

struct Window<'a> {
    hash: u64,
    file: &'a str,
    start: usize,
    end: usize,
}

/// Duplicate pairs and the percentage of lines covered by any of them
pub(crate) fn detect(units: &[DupUnit<'_>], block_kinds: &[&str]) -> (Vec<DuplicateBlock>, f64) {
    let total_lines: usize = units.iter().map(|u| u.lines).sum();
    let mut windows = Vec::new();
    for unit in units {
        collect_windows(unit.root, unit.rel_path, block_kinds, &mut windows);
    }

    let mut groups: FxHashMap<u64, Vec<&Window<'_>>> = FxHashMap::default();
    for window in &windows {
        groups.entry(window.hash).or_default().push(window);
    }

    let mut blocks = Vec::new();
    let mut duplicated: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for group in groups.values().filter(|g| g.len() > 1) {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                if a.file == b.file && a.start < b.end && b.start < a.end {
                    continue;
                }
                blocks.push(DuplicateBlock {
                    file_a: a.file.to_string(),
                    start_a: a.start,
                    end_a: a.end,
                    file_b: b.file.to_string(),
                    start_b: b.start,
                    end_b: b.end,
                    line_count: a.end - a.start + 1,
                });
                for w in [a, b] {
                    duplicated.entry(w.file).or_default().extend(w.start..=w.end);
                }
            }
        }
    }

    blocks.sort_by(|x, y| {
        (&x.file_a, x.start_a, x.end_a, &x.file_b, x.start_b)
            .cmp(&(&y.file_a, y.start_a, y.end_a, &y.file_b, y.start_b))
    });

    let duplicated_lines: usize = duplicated.values().map(BTreeSet::len).sum();
    let rate = if total_lines == 0 {
        0.0
    } else {
        duplicated_lines as f64 / total_lines as f64 * 100.0
    };
    (blocks, rate)
}

fn collect_windows<'a>(
    root: Node<'_>,
    file: &'a str,
    block_kinds: &[&str],
    out: &mut Vec<Window<'a>>,
) {
    walk_tree(root, |node| {
        if block_kinds.contains(&node.kind()) {
            block_windows(node, file, out);
        }
        true
    });
}

fn block_windows<'a>(block: Node<'_>, file: &'a str, out: &mut Vec<Window<'a>>) {
    let mut cursor = block.walk();
    let statements: Vec<Node<'_>> = block
        .children(&mut cursor)
        .filter(|c| c.is_named() && c.kind() != "comment")
        .collect();
    if statements.len() < MIN_STATEMENTS {
        return;
    }
    let shapes: Vec<u64> = statements.iter().map(|s| shape_hash(*s)).collect();

    for start in 0..=statements.len() - MIN_STATEMENTS {
        let mut hasher = Xxh3::new();
        let first_line = statements[start].start_position().row + 1;
        for (offset, shape) in shapes[start..].iter().enumerate() {
            hasher.update(&shape.to_le_bytes());
            let size = offset + 1;
            if size < MIN_STATEMENTS {
                continue;
            }
            let last_line = statements[start + offset].end_position().row + 1;
            if last_line - first_line + 1 < MIN_LINES {
                continue;
            }
            out.push(Window {
                hash: hasher.digest(),
                file,
                start: first_line,
                end: last_line,
            });
        }
    }
}

fn shape_hash(node: Node<'_>) -> u64 {
    let mut hasher = Xxh3::new();
    write_shape(&mut hasher, node, 0);
    hasher.digest()
}

fn write_shape(hasher: &mut Xxh3, node: Node<'_>, depth: usize) {
    if depth > MAX_HASH_DEPTH {
        return;
    }
    let kind = node.kind();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    hasher.update(&(node.child_count() as u64).to_le_bytes());
    match kind {
        "call" | "call_expression" => {
            if let Some(function) = node.child_by_field_name("function") {
                hasher.update(function.kind().as_bytes());
            }
        }
        "assignment" | "assignment_expression" | "assignment_statement"
        | "short_var_declaration" => hasher.update(b"="),
        "return_statement" => hasher.update(b"ret"),
        _ => {}
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor).take(MAX_HASH_CHILDREN) {
        write_shape(hasher, child, depth + 1);
    }
}
