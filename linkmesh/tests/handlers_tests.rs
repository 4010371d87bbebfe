use linkmesh::commands::command_argument_builder;
use linkmesh::handlers::*;
use linkmesh_core::report::{OpportunityRow, TableRow};
use linkmesh_core::{AnalysisConfig, EngineError, ReportFormat};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const CRAWL_CSV: &str = "\
Address,Status Code,Indexability,Link Score,Unique Inlinks,Crawl Depth
https://example.com/,200,Indexable,100,120,0
https://example.com/blog/seo-tips,200,Indexable,80,40,1
https://example.com/blog/seo-guide,200,Indexable,10,2,3
https://example.com/blog/seo-tools,200,Indexable,35,12,2
https://example.com/blog/seo-checklist,404,Non-Indexable,5,1,3
";

const PERFORMANCE_CSV: &str = "\
Page,Clicks,Impressions,CTR,Position
https://example.com/blog/seo-guide,12,500,2.4%,15
";

const LINKS_CSV: &str = "\
Source,Destination,Anchor
https://example.com/,https://example.com/blog/seo-tips,SEO tips
";

fn fixture(dir: &TempDir) -> AnalyzeArgs {
    let crawl = dir.path().join("crawl.csv");
    let performance = dir.path().join("performance.csv");
    let links = dir.path().join("links.csv");
    fs::write(&crawl, CRAWL_CSV).unwrap();
    fs::write(&performance, PERFORMANCE_CSV).unwrap();
    fs::write(&links, LINKS_CSV).unwrap();

    let mut args = AnalyzeArgs::new(crawl);
    args.performance = Some(performance);
    args.links = Some(links);
    // Never pick up a configuration from the user's home directory
    let config = dir.path().join("config.toml");
    write_default_config(&config).unwrap();
    args.config = Some(config);
    args
}

// ============================================================================
// Path and Config Tests
// ============================================================================

#[test]
fn test_expand_path_tilde() {
    let expanded = expand_path("~/linkmesh/config.toml");
    assert!(!expanded.to_string_lossy().starts_with('~'));
    assert!(expanded.ends_with("linkmesh/config.toml"));
}

#[test]
fn test_expand_path_plain() {
    assert_eq!(expand_path("/tmp/config.toml"), PathBuf::from("/tmp/config.toml"));
}

#[test]
fn test_write_default_config_creates_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    write_default_config(&path).unwrap();

    // An empty file would also load as the defaults
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("top_k_suggestions_per_page = 10"));
    assert!(content.contains("[priority_weights]"));

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded, AnalysisConfig::default());
}

#[test]
fn test_load_config_reports_failing_field() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_similarity_threshold = 2.0\n").unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("min_similarity_threshold"));
    assert!(message.contains("config.toml"));
}

#[test]
fn test_overrides_are_applied_and_validated() {
    let overrides = ConfigOverrides {
        top_n: Some(5),
        top_k: Some(3),
        min_similarity: Some(0.25),
    };
    let config = overrides.apply(AnalysisConfig::default()).unwrap();
    assert_eq!(config.top_n_pages_to_boost, 5);
    assert_eq!(config.top_k_suggestions_per_page, 3);
    assert_eq!(config.min_similarity_threshold, 0.25);

    let invalid = ConfigOverrides {
        top_k: Some(0),
        ..ConfigOverrides::default()
    };
    let err = invalid.apply(AnalysisConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Configuration { ref field, .. } if field == "top_k_suggestions_per_page"
    ));
}

// ============================================================================
// Argument Parsing Tests
// ============================================================================

#[test]
fn test_analyze_args_from_matches() {
    let matches = command_argument_builder()
        .try_get_matches_from([
            "linkmesh",
            "analyze",
            "--crawl",
            "crawl.csv",
            "--performance",
            "gsc.csv",
            "--top-n",
            "20",
            "--min-similarity",
            "0.2",
            "--format",
            "md",
            "--potential-only",
            "--min-source-link-score",
            "40",
        ])
        .unwrap();
    let (_, sub) = matches.subcommand().unwrap();

    let args = AnalyzeArgs::from_matches(sub).unwrap();

    assert_eq!(args.crawl, PathBuf::from("crawl.csv"));
    assert_eq!(args.performance, Some(PathBuf::from("gsc.csv")));
    assert!(args.links.is_none());
    assert_eq!(args.overrides.top_n, Some(20));
    assert_eq!(args.overrides.min_similarity, Some(0.2));
    assert_eq!(args.format, ReportFormat::Markdown);
    assert!(args.report.priority_filter.potential_only);
    assert_eq!(args.report.opportunity_filter.min_source_link_score, Some(40.0));
}

#[test]
fn test_analyze_requires_crawl_export() {
    let result = command_argument_builder().try_get_matches_from(["linkmesh", "analyze"]);
    assert!(result.is_err());
}

#[test]
fn test_unknown_format_is_rejected() {
    let result = command_argument_builder().try_get_matches_from([
        "linkmesh", "analyze", "--crawl", "c.csv", "--format", "html",
    ]);
    assert!(result.is_err());
}

// ============================================================================
// Analyze Tests
// ============================================================================

#[test]
fn test_run_analyze_text_report() {
    let dir = TempDir::new().unwrap();
    let args = fixture(&dir);

    let outcome = run_analyze(&args, None).unwrap();

    assert_eq!(outcome.summary.crawl_rows, 5);
    assert_eq!(outcome.summary.matched_performance, 1);
    assert_eq!(outcome.summary.link_rows, Some(1));
    assert_eq!(
        outcome.analysis.priority_pages()[0].url,
        "https://example.com/blog/seo-guide"
    );
    assert!(outcome.report.contains("PRIORITY PAGES"));
    assert!(!outcome.report.contains("seo-checklist"));
    assert!(outcome.exported.is_empty());
}

#[test]
fn test_run_analyze_json_with_exports() {
    let dir = TempDir::new().unwrap();
    let mut args = fixture(&dir);
    args.format = ReportFormat::Json;
    args.export_dir = Some(dir.path().join("tables"));

    let outcome = run_analyze(&args, None).unwrap();

    let value: serde_json::Value = serde_json::from_str(&outcome.report).unwrap();
    assert_eq!(value["report"]["metadata"]["generator"], "linkmesh");
    assert_eq!(outcome.exported.len(), 3);
    assert!(outcome.exported.iter().all(|p| p.exists()));
}

#[test]
fn test_run_analyze_applies_overrides() {
    let dir = TempDir::new().unwrap();
    let mut args = fixture(&dir);
    args.overrides.top_n = Some(1);
    args.overrides.top_k = Some(1);

    let outcome = run_analyze(&args, None).unwrap();

    assert_eq!(outcome.analysis.priority_target_count, 1);
    assert!(outcome.analysis.opportunities.len() <= 1);
}

#[test]
fn test_run_analyze_missing_crawl_file() {
    let dir = TempDir::new().unwrap();
    let mut args = fixture(&dir);
    args.crawl = dir.path().join("missing.csv");

    let err = run_analyze(&args, None).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to load exports"));
    assert!(message.contains("missing.csv"));
}

#[test]
fn test_run_analyze_reports_progress() {
    use std::sync::{Arc, Mutex};

    let dir = TempDir::new().unwrap();
    let args = fixture(&dir);
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = messages.clone();

    run_analyze(
        &args,
        Some(Arc::new(move |msg: String| sink.lock().unwrap().push(msg))),
    )
    .unwrap();

    let messages = messages.lock().unwrap();
    // Three export reads plus five pipeline stages
    assert_eq!(messages.len(), 8);
}

// ============================================================================
// Binary Output Tests
// ============================================================================

#[test]
fn test_csv_on_stdout_has_no_status_lines() {
    let dir = TempDir::new().unwrap();
    let args = fixture(&dir);

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_linkmesh"))
        .arg("analyze")
        .arg("--crawl")
        .arg(&args.crawl)
        .arg("--performance")
        .arg(args.performance.as_ref().unwrap())
        .arg("--config")
        .arg(args.config.as_ref().unwrap())
        .args(["--format", "csv", "--export-dir"])
        .arg(dir.path().join("tables"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let mut lines = stdout.lines();
    assert_eq!(lines.next().unwrap(), OpportunityRow::HEADERS.join(","));
    assert!(lines.all(|line| line.starts_with("https://")));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("linkmesh"));
    assert!(stderr.contains("Exported"));
}
