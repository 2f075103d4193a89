//! Raw metric values and evidence per category

use crate::models::{
    C1Metrics, C2Metrics, C3Metrics, C4Metrics, C6Metrics, CategoryMetrics, EvidenceItem,
    FunctionMetric, MetricSummary, TestFunctionMetric,
};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;

/// Maximum evidence items kept per metric
pub const EVIDENCE_TOP_N: usize = 5;

#[derive(Debug, Default)]
pub(super) struct Extracted {
    pub values: FxHashMap<&'static str, f64>,
    pub unavailable: FxHashSet<&'static str>,
    pub evidence: FxHashMap<&'static str, Vec<EvidenceItem>>,
}

impl Extracted {
    fn value(&mut self, metric: &'static str, raw: f64) {
        self.values.insert(metric, raw);
    }

    fn attach(&mut self, metric: &'static str, items: Vec<EvidenceItem>) {
        self.evidence.insert(metric, items);
    }
}

/// `None` when the metrics carry nothing to score
pub(super) fn extract(metrics: &CategoryMetrics) -> Option<Extracted> {
    match metrics {
        CategoryMetrics::CodeHealth(m) => Some(code_health(m)),
        CategoryMetrics::Semantics(m) => semantics(m),
        CategoryMetrics::Architecture(m) => Some(architecture(m)),
        CategoryMetrics::Documentation(m) => Some(documentation(m)),
        CategoryMetrics::Testing(m) => Some(testing(m)),
    }
}

fn item(file: &str, line: usize, value: f64, description: String) -> EvidenceItem {
    EvidenceItem {
        file_path: file.to_string(),
        line,
        value,
        description,
    }
}

fn top_functions<K: Ord>(
    functions: &[FunctionMetric],
    key: impl Fn(&FunctionMetric) -> K,
    describe: impl Fn(&FunctionMetric) -> EvidenceItem,
) -> Vec<EvidenceItem> {
    let mut sorted: Vec<&FunctionMetric> = functions.iter().collect();
    sorted.sort_by(|a, b| key(*b).cmp(&key(*a)));
    sorted.into_iter().take(EVIDENCE_TOP_N).map(describe).collect()
}

fn top_units(coupling: &BTreeMap<String, usize>, describe: fn(usize) -> String) -> Vec<EvidenceItem> {
    let mut entries: Vec<(&String, &usize)> = coupling.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    entries
        .into_iter()
        .take(EVIDENCE_TOP_N)
        .map(|(unit, count)| item(unit, 0, *count as f64, describe(*count)))
        .collect()
}

fn worst_entity(summary: &MetricSummary, description: String) -> Vec<EvidenceItem> {
    if summary.max_entity.is_empty() {
        return Vec::new();
    }
    vec![item(&summary.max_entity, 0, summary.max as f64, description)]
}

fn code_health(m: &C1Metrics) -> Extracted {
    let mut out = Extracted::default();
    out.value("complexity_avg", m.cyclomatic_complexity.avg);
    out.value("func_length_avg", m.function_length.avg);
    out.value("file_size_avg", m.file_size.avg);
    out.value("afferent_coupling_avg", m.afferent_coupling_avg);
    out.value("efferent_coupling_avg", m.efferent_coupling_avg);
    out.value("duplication_rate", m.duplication_rate);

    out.attach(
        "complexity_avg",
        top_functions(&m.functions, |f| f.complexity, |f| {
            item(
                &f.file,
                f.line,
                f.complexity as f64,
                format!("{} has complexity {}", f.name, f.complexity),
            )
        }),
    );
    out.attach(
        "func_length_avg",
        top_functions(&m.functions, |f| f.line_count, |f| {
            item(
                &f.file,
                f.line,
                f.line_count as f64,
                format!("{} is {} lines", f.name, f.line_count),
            )
        }),
    );
    out.attach(
        "file_size_avg",
        worst_entity(&m.file_size, format!("largest file: {} lines", m.file_size.max)),
    );
    out.attach(
        "afferent_coupling_avg",
        top_units(&m.afferent_coupling, |n| format!("imported by {} packages", n)),
    );
    out.attach(
        "efferent_coupling_avg",
        top_units(&m.efferent_coupling, |n| format!("imports {} packages", n)),
    );

    let mut blocks: Vec<_> = m.duplicated_blocks.iter().collect();
    blocks.sort_by(|a, b| b.line_count.cmp(&a.line_count));
    out.attach(
        "duplication_rate",
        blocks
            .into_iter()
            .take(EVIDENCE_TOP_N)
            .map(|b| {
                item(
                    &b.file_a,
                    b.start_a,
                    b.line_count as f64,
                    format!("{}-line duplicate block", b.line_count),
                )
            })
            .collect(),
    );
    out
}

fn semantics(m: &C2Metrics) -> Option<Extracted> {
    let agg = m.aggregate.as_ref()?;
    let mut out = Extracted::default();
    out.value("type_annotation_coverage", agg.type_annotation_coverage);
    out.value("naming_consistency", agg.naming_consistency);
    out.value("magic_number_ratio", agg.magic_number_ratio);
    out.value("type_strictness", agg.type_strictness);
    out.value("null_safety", agg.null_safety);
    Some(out)
}

fn architecture(m: &C3Metrics) -> Extracted {
    let mut out = Extracted::default();
    out.value("max_dir_depth", m.max_directory_depth as f64);
    out.value("module_fanout_avg", m.module_fanout.avg);
    out.value("circular_deps", m.circular_deps.len() as f64);
    out.value("import_complexity_avg", m.import_complexity.avg);
    out.value("dead_exports", m.dead_exports.len() as f64);

    out.attach(
        "module_fanout_avg",
        worst_entity(
            &m.module_fanout,
            format!("highest fanout: {} references", m.module_fanout.max),
        ),
    );
    out.attach(
        "circular_deps",
        m.circular_deps
            .iter()
            .take(EVIDENCE_TOP_N)
            .map(|cycle| {
                let first = cycle.first().map_or("", String::as_str);
                item(
                    first,
                    0,
                    cycle.len() as f64,
                    format!("cycle: {}", cycle.join(" -> ")),
                )
            })
            .collect(),
    );
    out.attach(
        "import_complexity_avg",
        worst_entity(
            &m.import_complexity,
            format!("most complex imports: {} segments", m.import_complexity.max),
        ),
    );
    out.attach(
        "dead_exports",
        m.dead_exports
            .iter()
            .take(EVIDENCE_TOP_N)
            .map(|d| item(&d.file, d.line, 1.0, format!("unused {}: {}", d.kind, d.name)))
            .collect(),
    );
    out
}

fn flag(present: bool) -> f64 {
    if present {
        1.0
    } else {
        0.0
    }
}

fn documentation(m: &C4Metrics) -> Extracted {
    let mut out = Extracted::default();
    out.value("readme_word_count", m.readme_word_count as f64);
    out.value("comment_density", m.comment_density);
    out.value("api_doc_coverage", m.api_doc_coverage);
    out.value("changelog_present", flag(m.changelog_present));
    out.value("examples_present", flag(m.examples_present));
    out.value("contributing_present", flag(m.contributing_present));
    out.value("diagrams_present", flag(m.diagrams_present));
    out
}

fn testing(m: &C6Metrics) -> Extracted {
    let mut out = Extracted::default();
    let test_file_ratio = if m.source_file_count > 0 {
        m.test_file_count as f64 / m.source_file_count as f64
    } else {
        0.0
    };
    out.value("test_to_code_ratio", m.test_to_code_ratio);
    out.value("coverage_percent", m.coverage_percent);
    out.value("test_isolation", m.test_isolation);
    out.value("assertion_density_avg", m.assertion_density.avg);
    out.value("test_file_ratio", test_file_ratio);
    if m.coverage_percent < 0.0 {
        out.unavailable.insert("coverage_percent");
    }

    out.attach(
        "test_isolation",
        m.test_functions
            .iter()
            .filter(|t| t.has_external_dep)
            .take(EVIDENCE_TOP_N)
            .map(|t| item(&t.file, t.line, 1.0, format!("{} has external dependency", t.name)))
            .collect(),
    );

    let mut weakest: Vec<&TestFunctionMetric> = m.test_functions.iter().collect();
    weakest.sort_by_key(|t| t.assertion_count);
    out.attach(
        "assertion_density_avg",
        weakest
            .into_iter()
            .take(EVIDENCE_TOP_N)
            .map(|t| {
                item(
                    &t.file,
                    t.line,
                    t.assertion_count as f64,
                    format!("{} has {} assertions", t.name, t.assertion_count),
                )
            })
            .collect(),
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{C2LanguageMetrics, DeadExport};

    fn function(name: &str, complexity: usize, line_count: usize) -> FunctionMetric {
        FunctionMetric {
            name: name.to_string(),
            file: format!("{}.go", name),
            line: 1,
            complexity,
            line_count,
        }
    }

    #[test]
    fn test_code_health_evidence_is_top_five_worst() {
        let functions: Vec<FunctionMetric> = (1..=7)
            .map(|i| function(&format!("f{}", i), i, 100 - i))
            .collect();
        let m = C1Metrics {
            functions,
            ..Default::default()
        };
        let out = code_health(&m);

        let complexity = &out.evidence["complexity_avg"];
        assert_eq!(complexity.len(), EVIDENCE_TOP_N);
        assert_eq!(complexity[0].description, "f7 has complexity 7");
        assert_eq!(out.evidence["func_length_avg"][0].description, "f1 is 99 lines");
        assert!(out.evidence["file_size_avg"].is_empty());
        assert!(out.evidence["duplication_rate"].is_empty());
    }

    #[test]
    fn test_semantics_without_aggregate_is_unscorable() {
        assert!(semantics(&C2Metrics::default()).is_none());

        let m = C2Metrics {
            aggregate: Some(C2LanguageMetrics {
                type_annotation_coverage: 40.0,
                ..Default::default()
            }),
            ..Default::default()
        };
        let out = semantics(&m).expect("aggregate");
        assert_eq!(out.values["type_annotation_coverage"], 40.0);
        assert!(out.evidence.is_empty());
    }

    #[test]
    fn test_architecture_evidence() {
        let m = C3Metrics {
            max_directory_depth: 4,
            circular_deps: vec![vec!["a".into(), "b".into(), "c".into()]],
            dead_exports: vec![DeadExport {
                package: "pkg/util".into(),
                name: "Helper".into(),
                file: "pkg/util/util.go".into(),
                line: 12,
                kind: "func".into(),
            }],
            ..Default::default()
        };
        let out = architecture(&m);
        assert_eq!(out.values["max_dir_depth"], 4.0);
        assert_eq!(out.values["circular_deps"], 1.0);
        assert_eq!(out.evidence["circular_deps"][0].description, "cycle: a -> b -> c");
        assert_eq!(out.evidence["dead_exports"][0].description, "unused func: Helper");
        assert_eq!(out.evidence["dead_exports"][0].line, 12);
        assert!(out.evidence["module_fanout_avg"].is_empty());
    }

    #[test]
    fn test_testing_marks_missing_coverage_unavailable() {
        let test = |name: &str, assertions: usize, external: bool| TestFunctionMetric {
            name: name.to_string(),
            file: "x_test.go".to_string(),
            line: 3,
            assertion_count: assertions,
            has_external_dep: external,
        };
        let m = C6Metrics {
            test_file_count: 1,
            source_file_count: 4,
            coverage_percent: -1.0,
            test_functions: vec![test("TestA", 3, true), test("TestB", 0, false)],
            ..Default::default()
        };
        let out = testing(&m);
        assert!(out.unavailable.contains("coverage_percent"));
        assert_eq!(out.values["test_file_ratio"], 0.25);
        assert_eq!(
            out.evidence["test_isolation"][0].description,
            "TestA has external dependency"
        );
        assert_eq!(
            out.evidence["assertion_density_avg"][0].description,
            "TestB has 0 assertions"
        );
    }
}
