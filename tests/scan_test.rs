//! End-to-end scans through the library API
//!
//! Each test writes a small project into its own temp directory and runs
//! the full pipeline: discovery, parsing, analyzers, scoring, recommendations.

use agentready::config::{load_project_config, ConfigError, ProjectConfig, CONFIG_FILE_NAME};
use agentready::models::{Category, Language};
use agentready::pipeline::{Pipeline, ScanReport};
use agentready::reporters::{render, OutputFormat};
use std::path::Path;
use tempfile::TempDir;

fn write_project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (rel, content) in files {
        let path = dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create dirs");
        }
        std::fs::write(&path, content).expect("Failed to write file");
    }
    dir
}

fn scan(root: &Path) -> ScanReport {
    let config = load_project_config(root, None).expect("Failed to load config");
    Pipeline::new(&config)
        .with_workers(2)
        .run(root)
        .expect("Scan failed")
}

fn category_score(report: &ScanReport, category: Category) -> f64 {
    report
        .scored
        .categories
        .iter()
        .find(|c| c.category == category)
        .map(|c| c.score)
        .expect("category scored")
}

const GO_CYCLE_PROJECT: &[(&str, &str)] = &[
    ("go.mod", "module example.com/app\n\ngo 1.22\n"),
    ("README.md", "# app\n\nA tiny service.\n"),
    (
        "a/a.go",
        "package a\n\nimport \"example.com/app/b\"\n\n// A calls into b.\nfunc A() int { return b.B() }\n",
    ),
    (
        "b/b.go",
        "package b\n\nimport \"example.com/app/a\"\n\n// B calls back into a.\nfunc B() int {\n\tif false {\n\t\treturn a.A()\n\t}\n\treturn 1\n}\n",
    ),
    (
        "b/b_test.go",
        "package b\n\nimport \"testing\"\n\nfunc TestB(t *testing.T) {\n\tif B() != 1 {\n\t\tt.Fatal(\"want 1\")\n\t}\n}\n",
    ),
];

#[test]
fn test_go_project_reports_import_cycle() {
    let dir = write_project(GO_CYCLE_PROJECT);
    let report = scan(dir.path());

    assert_eq!(report.languages, vec![Language::Go]);
    assert_eq!(report.files.source, 2);
    assert_eq!(report.files.test, 1);

    let architecture = report
        .scored
        .categories
        .iter()
        .find(|c| c.category == Category::C3)
        .expect("C3 scored");
    let cycles = architecture
        .sub_scores
        .iter()
        .find(|s| s.metric == "circular_deps")
        .expect("circular_deps sub-score");
    assert!(cycles.available);
    assert_eq!(cycles.raw_value, 1.0);
    assert_eq!(cycles.score, 6.0);
    assert!(cycles.evidence[0].description.starts_with("cycle: "));

    let composite = report.scored.composite.expect("composite");
    assert!((1.0..=10.0).contains(&composite));
    assert!(!report.scored.tier.is_empty());
}

#[test]
fn test_scan_is_deterministic() {
    let dir = write_project(GO_CYCLE_PROJECT);
    let first = scan(dir.path());
    let second = scan(dir.path());
    assert_eq!(first.scored, second.scored);
    assert_eq!(first.recommendations, second.recommendations);
}

#[test]
fn test_mixed_project_scores_every_language() {
    let dir = write_project(&[
        ("go.mod", "module example.com/mixed\n"),
        ("cmd/main.go", "package main\n\nfunc main() {}\n"),
        (
            "tools/build.py",
            "def build(target: str) -> bool:\n    \"\"\"Build one target.\"\"\"\n    return bool(target)\n",
        ),
        (
            "web/src/app.ts",
            "export function greet(name: string): string {\n  return `hi ${name}`;\n}\n",
        ),
        ("node_modules/dep/index.ts", "export const x: any = 1;\n"),
    ]);
    let report = scan(dir.path());

    assert_eq!(
        report.languages,
        vec![Language::Go, Language::Python, Language::TypeScript]
    );
    assert_eq!(report.files.source, 3);
    assert_eq!(report.results.len(), Category::ALL.len());
    assert!(report.scored.composite.is_some());
}

#[test]
fn test_config_restricts_languages_and_disables_metrics() {
    let dir = write_project(&[
        (
            CONFIG_FILE_NAME,
            "languages = [\"python\"]\n\n[scoring.weights]\nC4 = 0.0\n\n[metrics.complexity_avg]\nenabled = false\n",
        ),
        ("main.go", "package main\n\nfunc main() {}\n"),
        (
            "pkg/util.py",
            "def double(x):\n    if x > 0:\n        return x * 2\n    return 0\n",
        ),
    ]);
    let report = scan(dir.path());

    assert_eq!(report.languages, vec![Language::Python]);

    let code_health = report
        .scored
        .categories
        .iter()
        .find(|c| c.category == Category::C1)
        .expect("C1 scored");
    let complexity = code_health
        .sub_scores
        .iter()
        .find(|s| s.metric == "complexity_avg")
        .expect("complexity_avg sub-score");
    assert!(!complexity.available);

    let documentation = report
        .scored
        .categories
        .iter()
        .find(|c| c.category == Category::C4)
        .expect("C4 scored");
    assert_eq!(documentation.weight, 0.0);
    assert!(report
        .recommendations
        .iter()
        .all(|r| r.metric != "complexity_avg"));
}

#[test]
fn test_recommendations_are_ranked_and_bounded() {
    let dir = write_project(&[(
        "svc/handlers.py",
        "def handle(req, db, cache, log, retries):\n    if req:\n        for item in req:\n            if item and db:\n                while retries:\n                    retries -= 1\n    return cache\n",
    )]);
    let report = scan(dir.path());

    assert!(report.recommendations.len() <= 5);
    for (i, rec) in report.recommendations.iter().enumerate() {
        assert_eq!(rec.rank, i + 1);
        assert!(rec.score_improvement > 0.0);
        assert!(rec.target_score > rec.current_score);
    }
    for pair in report.recommendations.windows(2) {
        assert!(pair[0].score_improvement >= pair[1].score_improvement);
    }
}

#[test]
fn test_disabled_recommendations() {
    let dir = write_project(GO_CYCLE_PROJECT);
    let report = Pipeline::new(&ProjectConfig::default())
        .without_recommendations()
        .run(dir.path())
        .expect("Scan failed");
    assert!(report.recommendations.is_empty());
}

#[test]
fn test_project_without_source_files_fails() {
    let dir = write_project(&[("README.md", "# nothing to see\n"), ("notes.txt", "todo\n")]);
    let config = load_project_config(dir.path(), None).expect("Failed to load config");
    let err = Pipeline::new(&config)
        .run(dir.path())
        .expect_err("a project without sources cannot be scored");
    assert!(err.to_string().contains("source files found"));
}

#[test]
fn test_tests_only_project_leaves_code_categories_unscored() {
    let dir = write_project(&[(
        "tests/test_smoke.py",
        "def test_smoke():\n    assert 1 + 1 == 2\n",
    )]);
    let report = scan(dir.path());

    assert_eq!(report.files.source, 0);
    assert!(category_score(&report, Category::C1) < 0.0);
    assert!(category_score(&report, Category::C3) < 0.0);
    let composite = report.scored.composite.expect("testing and docs still score");
    assert!((1.0..=10.0).contains(&composite));
}

#[test]
fn test_invalid_config_is_fatal() {
    let dir = write_project(&[(CONFIG_FILE_NAME, "[scoring.weights]\nC9 = 1.0\n")]);
    let err = load_project_config(dir.path(), None).expect_err("config should be rejected");
    assert!(matches!(err, ConfigError::UnknownCategory(name) if name == "C9"));
}

#[test]
fn test_json_report_round_trips_through_serde() {
    let dir = write_project(GO_CYCLE_PROJECT);
    let report = scan(dir.path());
    let json = render(&report, OutputFormat::Json).expect("render JSON");
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["languages"][0], "go");
    assert_eq!(
        value["scored"]["categories"].as_array().map(|c| c.len()),
        Some(report.scored.categories.len())
    );
}
