// Tests for crawl, performance and link export loading

use linkmesh_core::{AnalysisConfig, AnalysisOptions, Indexability, run_analysis};
use linkmesh_loader::loader::{merge_performance, read_crawl, read_links, read_performance};
use linkmesh_loader::{ExportLoader, LoadError};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const CRAWL_CSV: &str = "\
Address, Status Code ,Indexability,Link Score,Unique Inlinks,Crawl Depth
https://example.com/blog/seo-tips,200,Indexable,80,40,1
https://example.com/blog/seo-guide,200,Indexable,10,2,3
https://example.com/old-page,404,Non-Indexable,0,1,2
https://example.com/broken,oops,Indexable,5,1,1
";

const PERFORMANCE_CSV: &str = "\
Top pages,Clicks,Impressions,CTR,Position
https://example.com/blog/seo-guide,12,500,2.4%,15
https://example.com/blog/seo-tips,30,900,0.033,n/a
https://example.com/not-crawled,1,10,10%,40
";

const LINKS_CSV: &str = "\
Type,Source,Destination,Anchor
Hyperlink,https://example.com/blog/seo-tips,https://example.com/,Home
Hyperlink,https://example.com/blog/seo-tips,https://example.com/blog/,Blog
Hyperlink,https://example.com/blog/seo-guide,https://example.com/,
";

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// Crawl Export Tests
// ============================================================================

#[test]
fn test_read_crawl_trims_headers_and_parses_rows() {
    let export = read_crawl(CRAWL_CSV.as_bytes(), Path::new("crawl.csv")).unwrap();

    assert_eq!(export.pages.len(), 3);
    assert_eq!(export.rejected_rows, 1);
    assert!(export.defaulted_columns.is_empty());

    let tips = &export.pages[0];
    assert_eq!(tips.url, "https://example.com/blog/seo-tips");
    assert_eq!(tips.link_score, 80.0);
    assert_eq!(tips.unique_inlinks, 40);
    assert_eq!(tips.crawl_depth, 1);
    assert!(tips.is_eligible());

    let old = &export.pages[2];
    assert_eq!(old.status_code, 404);
    assert_eq!(old.indexability, Indexability::NonIndexable);
    assert!(!old.is_eligible());
}

#[test]
fn test_read_crawl_missing_required_columns() {
    let csv = "Address,Link Score\nhttps://example.com/,10\n";
    let err = read_crawl(csv.as_bytes(), Path::new("crawl.csv")).unwrap_err();

    match err {
        LoadError::MissingColumns { export, columns } => {
            assert_eq!(export, "crawl");
            assert_eq!(columns, vec!["Status Code".to_string()]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_read_crawl_defaults_optional_columns() {
    let csv = "Address,Status Code\nhttps://example.com/a,200\n";
    let export = read_crawl(csv.as_bytes(), Path::new("crawl.csv")).unwrap();

    assert_eq!(export.pages.len(), 1);
    assert_eq!(export.pages[0].link_score, 0.0);
    assert_eq!(export.pages[0].indexability, Indexability::Indexable);
    assert_eq!(
        export.defaulted_columns,
        vec!["Link Score", "Unique Inlinks", "Crawl Depth", "Indexability"]
    );
}

#[test]
fn test_read_crawl_unparseable_numbers_become_zero() {
    let csv = "Address,Status Code,Link Score,Unique Inlinks\n\
               https://example.com/a,200,high,many\n";
    let export = read_crawl(csv.as_bytes(), Path::new("crawl.csv")).unwrap();

    assert_eq!(export.pages[0].link_score, 0.0);
    assert_eq!(export.pages[0].unique_inlinks, 0);
}

#[test]
fn test_read_crawl_empty_export() {
    let csv = "Address,Status Code\n";
    let err = read_crawl(csv.as_bytes(), Path::new("empty.csv")).unwrap_err();
    assert!(matches!(err, LoadError::Empty { .. }));
    assert!(err.to_string().contains("empty.csv"));
}

// ============================================================================
// Performance Export Tests
// ============================================================================

#[test]
fn test_read_performance_detects_url_column() {
    let rows = read_performance(PERFORMANCE_CSV.as_bytes()).unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].url, "https://example.com/blog/seo-guide");
    assert_eq!(rows[0].impressions, 500.0);
    assert!((rows[0].ctr - 0.024).abs() < 1e-12);
    assert_eq!(rows[0].position, Some(15.0));

    // Unparseable position is absent rather than a default
    assert_eq!(rows[1].position, None);
    assert!((rows[1].ctr - 0.033).abs() < 1e-12);
}

#[test]
fn test_read_performance_non_finite_cells_are_coerced() {
    let csv = "\
Page,Clicks,Impressions,CTR,Position
https://example.com/blog/seo-guide,NaN,inf,-infinity%,NaN
https://example.com/blog/seo-tips,3,infinity,0.1,inf
";
    let rows = read_performance(csv.as_bytes()).unwrap();

    assert_eq!(rows[0].clicks, 0.0);
    assert_eq!(rows[0].impressions, 0.0);
    assert_eq!(rows[0].ctr, 0.0);
    assert_eq!(rows[0].position, None);
    assert_eq!(rows[1].impressions, 0.0);
    assert_eq!(rows[1].position, None);
}

#[test]
fn test_non_finite_performance_does_not_fail_analysis() {
    let dir = TempDir::new().unwrap();
    let crawl = write(&dir, "crawl.csv", CRAWL_CSV);
    let performance = write(
        &dir,
        "gsc.csv",
        "Page,Clicks,Impressions,CTR,Position\n\
         https://example.com/blog/seo-guide,4,inf,1%,NaN\n",
    );

    let loaded = ExportLoader::new()
        .with_performance(&performance)
        .load(&crawl)
        .unwrap();
    let analysis = run_analysis(
        loaded.into_input(),
        &AnalysisConfig::default(),
        &AnalysisOptions::default(),
    )
    .unwrap();

    assert!(analysis.diagnostics.skipped_pages.is_empty());
    assert!(analysis.eligible.contains("https://example.com/blog/seo-guide"));
}

#[test]
fn test_read_performance_missing_columns() {
    let csv = "Page,Clicks\nhttps://example.com/,1\n";
    let err = read_performance(csv.as_bytes()).unwrap_err();

    match err {
        LoadError::MissingColumns { export, columns } => {
            assert_eq!(export, "performance");
            assert_eq!(columns, vec!["Impressions", "CTR", "Position"]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_merge_performance_left_join() {
    let mut pages = read_crawl(CRAWL_CSV.as_bytes(), Path::new("crawl.csv"))
        .unwrap()
        .pages;
    let rows = read_performance(PERFORMANCE_CSV.as_bytes()).unwrap();

    let matched = merge_performance(&mut pages, &rows);

    assert_eq!(matched, 2);
    assert_eq!(pages[1].impressions(), Some(500.0));
    assert_eq!(pages[1].position(), Some(15.0));
    assert!(pages[2].performance.is_none());
}

// ============================================================================
// Link Export Tests
// ============================================================================

#[test]
fn test_read_links_keeps_every_row() {
    let edges = read_links(LINKS_CSV.as_bytes()).unwrap();

    assert_eq!(edges.len(), 3);
    assert_eq!(edges[0].source, "https://example.com/blog/seo-tips");
    assert_eq!(edges[1].anchor, "Blog");
    assert_eq!(edges[2].anchor, "");
}

#[test]
fn test_read_links_missing_anchor_column() {
    let csv = "Source,Destination\na,b\n";
    let err = read_links(csv.as_bytes()).unwrap_err();
    assert!(err.to_string().contains("Anchor"));
}

// ============================================================================
// ExportLoader Tests
// ============================================================================

#[test]
fn test_export_loader_merges_all_exports() {
    let dir = TempDir::new().unwrap();
    let crawl = write(&dir, "crawl.csv", CRAWL_CSV);
    let performance = write(&dir, "gsc.csv", PERFORMANCE_CSV);
    let links = write(&dir, "links.csv", LINKS_CSV);

    let loaded = ExportLoader::new()
        .with_performance(&performance)
        .with_links(&links)
        .load(&crawl)
        .unwrap();

    assert_eq!(loaded.pages.len(), 3);
    assert_eq!(loaded.summary.crawl_rows, 4);
    assert_eq!(loaded.summary.rejected_rows, 1);
    assert_eq!(loaded.summary.performance_rows, 3);
    assert_eq!(loaded.summary.matched_performance, 2);
    assert_eq!(loaded.summary.unmatched_performance(), 1);
    assert_eq!(loaded.summary.link_rows, Some(3));

    let input = loaded.into_input();
    assert_eq!(input.pages.len(), 3);
    assert_eq!(input.edges.map(|e| e.len()), Some(3));
}

#[test]
fn test_export_loader_crawl_only() {
    let dir = TempDir::new().unwrap();
    let crawl = write(&dir, "crawl.csv", CRAWL_CSV);

    let loaded = ExportLoader::new().load(&crawl).unwrap();

    assert!(loaded.edges.is_none());
    assert_eq!(loaded.summary.link_rows, None);
    assert!(loaded.pages.iter().all(|p| p.performance.is_none()));
}

#[test]
fn test_export_loader_missing_file() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.csv");

    let err = ExportLoader::new().load(&missing).unwrap_err();

    assert!(matches!(err, LoadError::Io { .. }));
    assert!(err.to_string().contains("nope.csv"));
}

#[test]
fn test_export_loader_reports_progress() {
    use std::sync::{Arc, Mutex};

    let dir = TempDir::new().unwrap();
    let crawl = write(&dir, "crawl.csv", CRAWL_CSV);
    let messages = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = messages.clone();

    ExportLoader::new()
        .with_progress_callback(Arc::new(move |msg: String| sink.lock().unwrap().push(msg)))
        .load(&crawl)
        .unwrap();

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Reading crawl export"));
}
