//! Go architecture over the loaded workspace. Test variants are ignored.

use super::{segment_count, LanguageArchitecture};
use crate::graph::{depth_summary, ImportGraph};
use crate::models::{DeadExport, MetricSummary};
use crate::parsers::{GoWorkspace, SymbolKind};

/// Package graph with intra-module edges only
pub(crate) fn build_import_graph(ws: &GoWorkspace) -> ImportGraph {
    let mut graph = ImportGraph::new();
    for pkg in ws.source_packages() {
        graph.add_node(&pkg.path);
        for import in &pkg.imports {
            if ws.is_intra_module(import) && ws.package(import).is_some() {
                graph.add_edge(&pkg.path, import);
            }
        }
    }
    graph
}

pub(super) fn analyze(ws: &GoWorkspace) -> LanguageArchitecture {
    let graph = build_import_graph(ws);
    let loc = ws.source_packages().map(|p| p.lines()).sum();
    let mut result = LanguageArchitecture::from_graph(&graph, loc);

    let (max_depth, avg_depth) = depth_summary(
        ws.source_packages()
            .map(|p| ws.module_relative(&p.path).map_or(0, segment_count)),
    );
    result.max_depth = max_depth;
    result.avg_depth = avg_depth;
    result.import_complexity = import_complexity(ws);
    result.dead_exports = dead_exports(ws);
    result
}

fn import_complexity(ws: &GoWorkspace) -> MetricSummary {
    let imports: Vec<(&str, usize)> = ws
        .source_packages()
        .flat_map(|p| p.imports.iter())
        .filter_map(|import| {
            ws.module_relative(import)
                .filter(|rel| !rel.is_empty())
                .map(|rel| (import.as_str(), segment_count(rel)))
        })
        .collect();
    MetricSummary::from_values(imports)
}

/// Exported functions and types no other package references
fn dead_exports(ws: &GoWorkspace) -> Vec<DeadExport> {
    if ws.source_packages().count() <= 1 {
        return Vec::new();
    }
    let uses = ws.cross_package_uses();
    let mut dead = Vec::new();
    for pkg in ws.source_packages() {
        for sym in &pkg.symbols {
            let candidate = sym.exported
                && match sym.kind {
                    SymbolKind::Func => sym.name != "main" && sym.name != "init",
                    SymbolKind::Type => true,
                    _ => false,
                };
            if !candidate || uses.contains(&(pkg.path.clone(), sym.name.clone())) {
                continue;
            }
            dead.push(DeadExport {
                package: pkg.path.clone(),
                name: sym.name.clone(),
                file: sym.file.clone(),
                line: sym.line,
                kind: sym.kind.as_str().to_string(),
            });
        }
    }
    dead
}
