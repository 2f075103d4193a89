use super::*;

fn parse(content: &str) -> Result<ProjectConfig, ConfigError> {
    ProjectConfig::from_toml(content, Path::new(CONFIG_FILE_NAME))
}

#[test]
fn test_default_config() {
    let config = ProjectConfig::default();
    assert_eq!(config.version, 1);
    assert!(config.languages().is_none());
    assert!(config.threshold().is_none());
    assert_eq!(config.scoring_config(), ScoringConfig::default());
}

#[test]
fn test_parse_toml_config() {
    let config = parse(
        r#"
version = 1
languages = ["go", "TypeScript"]

[scoring]
threshold = 6.5

[scoring.weights]
C1 = 0.4
c6 = 0.0

[[scoring.tiers]]
name = "Not Ready"
min_score = 1.0

[[scoring.tiers]]
name = "Ready"
min_score = 7.5

[metrics.complexity_avg]
breakpoints = [{ value = 1, score = 10 }, { value = 10, score = 5 }, { value = 30, score = 1 }]

[metrics.coverage_percent]
enabled = false
"#,
    )
    .expect("valid config");

    assert_eq!(
        config.languages(),
        Some(vec![Language::Go, Language::TypeScript])
    );
    assert_eq!(config.threshold(), Some(6.5));

    let scoring = config.scoring_config();
    assert_eq!(scoring.category(Category::C1).expect("C1").weight, 0.4);
    assert_eq!(scoring.category(Category::C6).expect("C6").weight, 0.0);
    assert_eq!(scoring.category(Category::C3).expect("C3").weight, 0.20);

    let tiers: Vec<&str> = scoring.tiers.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(tiers, vec!["Ready", "Not Ready"]);

    let (_, complexity) = scoring.find_metric("complexity_avg").expect("metric");
    assert_eq!(complexity.breakpoints.len(), 3);
    assert!(complexity.enabled);
    let (_, coverage) = scoring.find_metric("coverage_percent").expect("metric");
    assert!(!coverage.enabled);
}

#[test]
fn test_version_zero_is_accepted() {
    assert!(parse("version = 0").is_ok());
    assert!(matches!(
        parse("version = 2"),
        Err(ConfigError::UnsupportedVersion(2))
    ));
}

#[test]
fn test_unknown_keys_are_rejected() {
    assert!(matches!(
        parse("verbose = true"),
        Err(ConfigError::Parse { .. })
    ));
    assert!(matches!(
        parse("[scoring]\nsecurity_multiplier = 3.0"),
        Err(ConfigError::Parse { .. })
    ));
    assert!(matches!(
        parse("[metrics.complexity_avg]\nthreshold = 3"),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_unknown_names_are_rejected() {
    assert!(matches!(
        parse("[scoring.weights]\nC5 = 0.1"),
        Err(ConfigError::UnknownCategory(name)) if name == "C5"
    ));
    assert!(matches!(
        parse("[metrics.churn_rate]\nenabled = false"),
        Err(ConfigError::UnknownMetric(name)) if name == "churn_rate"
    ));
    assert!(matches!(
        parse("languages = [\"rust\"]"),
        Err(ConfigError::UnknownLanguage(_))
    ));
}

#[test]
fn test_negative_values_are_rejected() {
    assert!(matches!(
        parse("[scoring]\nthreshold = -1.0"),
        Err(ConfigError::NegativeThreshold(_))
    ));
    assert!(matches!(
        parse("[scoring.weights]\nC2 = -0.1"),
        Err(ConfigError::NegativeWeight { .. })
    ));
}

#[test]
fn test_non_finite_numbers_are_rejected() {
    for content in [
        "[scoring.weights]\nC1 = inf",
        "[scoring.weights]\nC1 = nan",
        "[scoring]\nthreshold = inf",
        "[scoring]\nthreshold = nan",
        "[[scoring.tiers]]\nname = \"Top\"\nmin_score = nan",
        "[[scoring.tiers]]\nname = \"Top\"\nmin_score = -inf",
        "[metrics.file_size_avg]\nbreakpoints = [{ value = 50, score = 10 }, { value = inf, score = 1 }]",
    ] {
        assert!(
            matches!(parse(content), Err(ConfigError::NotFinite { .. })),
            "{}",
            content
        );
    }
}

#[test]
fn test_breakpoint_validation() {
    let descending = r#"
[metrics.file_size_avg]
breakpoints = [{ value = 100, score = 8 }, { value = 50, score = 10 }]
"#;
    assert!(matches!(
        parse(descending),
        Err(ConfigError::BreakpointsNotAscending(_))
    ));

    let out_of_range = r#"
[metrics.file_size_avg]
breakpoints = [{ value = 50, score = 11 }, { value = 100, score = 8 }]
"#;
    assert!(matches!(
        parse(out_of_range),
        Err(ConfigError::ScoreOutOfRange { score, .. }) if score == 11.0
    ));

    assert!(matches!(
        parse("[scoring]\ntiers = []"),
        Err(ConfigError::NoTiers)
    ));
}

#[test]
fn test_load_project_config_lookup() {
    let dir = tempfile::tempdir().expect("tempdir");

    let config = load_project_config(dir.path(), None).expect("defaults");
    assert!(config.threshold().is_none());

    std::fs::write(
        dir.path().join(CONFIG_FILE_NAME),
        "[scoring]\nthreshold = 5.0\n",
    )
    .expect("write config");
    let config = load_project_config(dir.path(), None).expect("config");
    assert_eq!(config.threshold(), Some(5.0));

    let missing = dir.path().join("nope.toml");
    assert!(matches!(
        load_project_config(dir.path(), Some(&missing)),
        Err(ConfigError::Read { .. })
    ));
}
