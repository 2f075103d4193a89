//! Cycle detection over the import graph
//!
//! Depth-first search with three colours. An edge into a node still on the
//! current path closes a cycle, which is rebuilt from parent pointers and
//! reversed into forward order. Nodes and neighbours are visited in sorted
//! order so the output is stable across runs.

use super::ImportGraph;
use std::collections::{HashMap, HashSet};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

/// Rotate a cycle so it starts with its smallest element.
pub fn normalize_cycle(cycle: &[String]) -> Vec<String> {
    if cycle.is_empty() {
        return vec![];
    }

    let min_idx = cycle
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| *v)
        .map(|(i, _)| i)
        .unwrap_or(0);

    let mut normalized = Vec::with_capacity(cycle.len());
    normalized.extend_from_slice(&cycle[min_idx..]);
    normalized.extend_from_slice(&cycle[..min_idx]);
    normalized
}

pub(super) fn find_cycles(graph: &ImportGraph) -> Vec<Vec<String>> {
    let mut color: HashMap<&str, Color> = graph.nodes().map(|n| (n, Color::White)).collect();
    let mut parent: HashMap<&str, &str> = HashMap::new();
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    let mut cycles = Vec::new();

    for start in graph.nodes() {
        if color.get(start) != Some(&Color::White) {
            continue;
        }
        color.insert(start, Color::Gray);
        let mut stack: Vec<(&str, Vec<&str>, usize)> =
            vec![(start, graph.imports(start).collect(), 0)];

        while let Some((node, neighbours, next)) = stack.last_mut() {
            let node = *node;
            if *next >= neighbours.len() {
                color.insert(node, Color::Black);
                stack.pop();
                continue;
            }
            let neighbour = neighbours[*next];
            *next += 1;

            match color.get(neighbour).copied().unwrap_or(Color::White) {
                Color::White => {
                    parent.insert(neighbour, node);
                    color.insert(neighbour, Color::Gray);
                    stack.push((neighbour, graph.imports(neighbour).collect(), 0));
                }
                Color::Gray => {
                    let cycle = reconstruct(neighbour, node, &parent);
                    let canonical = normalize_cycle(&cycle);
                    if seen.insert(canonical.clone()) {
                        cycles.push(canonical);
                    }
                }
                Color::Black => {}
            }
        }
    }

    cycles
}

/// Walk parent pointers from `current` back to `cycle_start`, then reverse
fn reconstruct<'a>(
    cycle_start: &'a str,
    current: &'a str,
    parent: &HashMap<&'a str, &'a str>,
) -> Vec<String> {
    let mut cycle = vec![cycle_start.to_string()];
    let mut cur = current;
    while cur != cycle_start {
        cycle.push(cur.to_string());
        match parent.get(cur) {
            Some(p) => cur = *p,
            None => break,
        }
    }
    cycle.reverse();
    cycle
}
