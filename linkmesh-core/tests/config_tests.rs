// Tests for analysis configuration loading and validation

use linkmesh_core::EngineError;
use linkmesh_core::config::{AnalysisConfig, PriorityWeights};
use std::fs;
use tempfile::TempDir;

fn failing_field(config: &AnalysisConfig) -> String {
    match config.validate() {
        Err(EngineError::Configuration { field, .. }) => field,
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

// ============================================================================
// Defaults
// ============================================================================

#[test]
fn test_default_config_is_valid() {
    let config = AnalysisConfig::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.top_n_pages_to_boost, 50);
    assert_eq!(config.top_k_suggestions_per_page, 10);
    assert_eq!(config.min_similarity_threshold, 0.1);
    assert!(!config.skip_existing_links);
    assert!((config.priority_weights.sum() - 1.0).abs() < 1e-9);
}

#[test]
fn test_default_config_survives_toml_output() {
    let config = AnalysisConfig::default();
    let toml = config.to_toml_string().unwrap();

    assert!(toml.contains("[priority_weights]"));
    assert!(toml.contains("[similarity]"));
    assert_eq!(AnalysisConfig::from_toml_str(&toml).unwrap(), config);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_priority_weights_must_sum_to_one() {
    let config = AnalysisConfig {
        priority_weights: PriorityWeights {
            impressions: 0.3,
            position: 0.2,
            link_score: 0.3,
            depth: 0.1,
        },
        ..AnalysisConfig::default()
    };

    assert_eq!(failing_field(&config), "priority_weights");
    let message = config.validate().unwrap_err().to_string();
    assert!(message.contains("priority_weights"));
    assert!(message.contains("sum to 1.0"));
}

#[test]
fn test_priority_weights_tolerate_float_drift() {
    let config = AnalysisConfig {
        priority_weights: PriorityWeights {
            impressions: 0.1 + 0.2,
            position: 0.2,
            link_score: 0.3,
            depth: 0.2,
        },
        ..AnalysisConfig::default()
    };
    assert!(config.validate().is_ok());
}

#[test]
fn test_negative_weight_names_the_field() {
    let mut config = AnalysisConfig::default();
    config.opportunity_weights.outlinks_penalty = -0.1;
    assert_eq!(failing_field(&config), "opportunity_weights.outlinks_penalty");
}

#[test]
fn test_non_finite_weight_is_rejected() {
    let mut config = AnalysisConfig::default();
    config.priority_weights.depth = f64::NAN;
    assert_eq!(failing_field(&config), "priority_weights.depth");
}

#[test]
fn test_threshold_outside_unit_interval() {
    let mut config = AnalysisConfig::default();
    config.min_similarity_threshold = 1.5;
    assert_eq!(failing_field(&config), "min_similarity_threshold");

    let mut config = AnalysisConfig::default();
    config.potential.weakness_floor = -0.2;
    assert_eq!(failing_field(&config), "potential.weakness_floor");
}

#[test]
fn test_counts_must_be_positive() {
    let mut config = AnalysisConfig::default();
    config.top_k_suggestions_per_page = 0;
    assert_eq!(failing_field(&config), "top_k_suggestions_per_page");

    let mut config = AnalysisConfig::default();
    config.top_n_pages_to_boost = 0;
    assert_eq!(failing_field(&config), "top_n_pages_to_boost");

    let mut config = AnalysisConfig::default();
    config.max_outlinks_warning = 0;
    assert_eq!(failing_field(&config), "max_outlinks_warning");
}

#[test]
fn test_ngram_max_limited_to_bigrams() {
    let mut config = AnalysisConfig::default();
    config.similarity.ngram_max = 3;
    assert_eq!(failing_field(&config), "similarity.ngram_max");
}

#[test]
fn test_position_window_bounds() {
    let mut config = AnalysisConfig::default();
    config.position_window.min = 0.0;
    assert_eq!(failing_field(&config), "position_window.min");

    let mut config = AnalysisConfig::default();
    config.position_window.max = 1.0;
    assert_eq!(failing_field(&config), "position_window.max");
}

// ============================================================================
// TOML Loading
// ============================================================================

#[test]
fn test_partial_toml_falls_back_to_defaults() {
    let toml = r#"
top_n_pages_to_boost = 5
skip_existing_links = true

[priority_weights]
impressions = 0.5
position = 0.1
link_score = 0.2
depth = 0.2
"#;
    let config = AnalysisConfig::from_toml_str(toml).unwrap();

    assert_eq!(config.top_n_pages_to_boost, 5);
    assert!(config.skip_existing_links);
    assert_eq!(config.priority_weights.impressions, 0.5);
    assert_eq!(config.top_k_suggestions_per_page, 10);
    assert_eq!(config.similarity.max_features, 1000);
    assert!(config.validate().is_ok());
}

#[test]
fn test_malformed_toml_is_a_parse_error() {
    let err = AnalysisConfig::from_toml_str("top_n_pages_to_boost = \"many\"").unwrap_err();
    assert!(matches!(err, EngineError::ConfigParse(_)));
}

#[test]
fn test_load_validates_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[priority_weights]\nimpressions = 0.9\n").unwrap();

    let err = AnalysisConfig::load(&path).unwrap_err();
    assert!(
        matches!(err, EngineError::Configuration { ref field, .. } if field == "priority_weights")
    );
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = AnalysisConfig::load(&dir.path().join("missing.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Io(_)));
}
