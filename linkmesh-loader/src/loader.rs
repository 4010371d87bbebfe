use crate::error::{LoadError, Result};
use crate::record::{LoadSummary, LoadedExports, PerformanceRow};
use csv::{ReaderBuilder, StringRecord, Trim};
use linkmesh_core::{Indexability, LinkEdge, Page, Performance};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub type LoadProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

const CRAWL_EXPORT: &str = "crawl";
const PERFORMANCE_EXPORT: &str = "performance";
const LINK_EXPORT: &str = "link";

const ADDRESS: &str = "Address";
const STATUS_CODE: &str = "Status Code";
const LINK_SCORE: &str = "Link Score";
const UNIQUE_INLINKS: &str = "Unique Inlinks";
const CRAWL_DEPTH: &str = "Crawl Depth";
const INDEXABILITY: &str = "Indexability";

const PAGE: &str = "Page";
const CLICKS: &str = "Clicks";
const IMPRESSIONS: &str = "Impressions";
const CTR: &str = "CTR";
const POSITION: &str = "Position";

const SOURCE: &str = "Source";
const DESTINATION: &str = "Destination";
const ANCHOR: &str = "Anchor";

/// Reads a crawl export plus the optional performance and link exports
#[derive(Default)]
pub struct ExportLoader {
    performance: Option<PathBuf>,
    links: Option<PathBuf>,
    progress_callback: Option<LoadProgressCallback>,
}

impl ExportLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_performance(mut self, path: impl Into<PathBuf>) -> Self {
        self.performance = Some(path.into());
        self
    }

    pub fn with_links(mut self, path: impl Into<PathBuf>) -> Self {
        self.links = Some(path.into());
        self
    }

    pub fn with_progress_callback(mut self, callback: LoadProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn load(&self, crawl_path: impl AsRef<Path>) -> Result<LoadedExports> {
        let crawl_path = crawl_path.as_ref();

        self.report(format!("Reading crawl export {}", crawl_path.display()));
        let crawl = read_crawl(open(crawl_path)?, crawl_path)?;
        let mut pages = crawl.pages;

        let mut summary = LoadSummary {
            crawl_rows: pages.len() + crawl.rejected_rows,
            rejected_rows: crawl.rejected_rows,
            defaulted_columns: crawl.defaulted_columns,
            ..LoadSummary::default()
        };

        if let Some(path) = &self.performance {
            self.report(format!("Reading performance export {}", path.display()));
            let rows = read_performance(open(path)?)?;
            if rows.is_empty() {
                warn!("Performance export {} has no rows", path.display());
            }
            summary.performance_rows = rows.len();
            summary.matched_performance = merge_performance(&mut pages, &rows);
            if summary.unmatched_performance() > 0 {
                debug!(
                    "{} performance row(s) did not match a crawled page",
                    summary.unmatched_performance()
                );
            }
        }

        let edges = match &self.links {
            Some(path) => {
                self.report(format!("Reading link export {}", path.display()));
                let edges = read_links(open(path)?)?;
                summary.link_rows = Some(edges.len());
                Some(edges)
            }
            None => None,
        };

        info!(
            "Loaded {} page(s) ({} rejected), {} with performance data",
            pages.len(),
            summary.rejected_rows,
            summary.matched_performance
        );

        Ok(LoadedExports {
            pages,
            edges,
            summary,
        })
    }

    fn report(&self, message: String) {
        if let Some(callback) = &self.progress_callback {
            callback(message);
        }
    }
}

/// Pages parsed from a crawl export
#[derive(Debug, Clone, Default)]
pub struct CrawlExport {
    pub pages: Vec<Page>,
    pub rejected_rows: usize,
    pub defaulted_columns: Vec<String>,
}

/// Parse a crawl export. `source` names the file in errors.
pub fn read_crawl<R: Read>(reader: R, source: &Path) -> Result<CrawlExport> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let address = find_column(&headers, ADDRESS);
    let status = find_column(&headers, STATUS_CODE);
    let missing: Vec<String> = [(ADDRESS, address), (STATUS_CODE, status)]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    let (Some(address), Some(status)) = (address, status) else {
        return Err(LoadError::MissingColumns {
            export: CRAWL_EXPORT,
            columns: missing,
        });
    };

    let mut defaulted_columns = Vec::new();
    let mut optional = |name: &str| {
        let idx = find_column(&headers, name);
        if idx.is_none() {
            warn!("Crawl export has no `{}` column, using the default", name);
            defaulted_columns.push(name.to_string());
        }
        idx
    };
    let link_score = optional(LINK_SCORE);
    let inlinks = optional(UNIQUE_INLINKS);
    let depth = optional(CRAWL_DEPTH);
    let indexability = optional(INDEXABILITY);

    let mut pages = Vec::new();
    let mut rejected_rows = 0;
    let mut rows = 0;

    for record in csv_reader.records() {
        let record = record?;
        rows += 1;

        let url = cell(&record, Some(address));
        let Some(status_code) = parse_status(cell(&record, Some(status))) else {
            debug!("Rejecting crawl row for '{}': unreadable status code", url);
            rejected_rows += 1;
            continue;
        };

        let indexability = match indexability {
            Some(idx) => Indexability::from_label(cell(&record, Some(idx))),
            None => Indexability::Indexable,
        };

        let page = Page::new(url, parse_number(cell(&record, link_score)).unwrap_or(0.0))
            .with_inlinks(parse_count(cell(&record, inlinks)))
            .with_depth(parse_count(cell(&record, depth)))
            .with_status(status_code)
            .with_indexability(indexability);
        pages.push(page);
    }

    if rows == 0 {
        return Err(LoadError::Empty {
            path: source.to_path_buf(),
        });
    }

    if rejected_rows > 0 {
        warn!("{} crawl row(s) rejected for an unreadable status code", rejected_rows);
    }

    Ok(CrawlExport {
        pages,
        rejected_rows,
        defaulted_columns,
    })
}

/// Parse a search performance export
///
/// The URL column is `Page` when present, otherwise the first header that
/// mentions "page" or "url".
pub fn read_performance<R: Read>(reader: R) -> Result<Vec<PerformanceRow>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let url = find_column(&headers, PAGE).or_else(|| {
        headers.iter().position(|h| {
            let h = clean_header(h).to_lowercase();
            h.contains("page") || h.contains("url")
        })
    });
    let clicks = find_column(&headers, CLICKS);
    let impressions = find_column(&headers, IMPRESSIONS);
    let ctr = find_column(&headers, CTR);
    let position = find_column(&headers, POSITION);

    let required = [
        (PAGE, url),
        (CLICKS, clicks),
        (IMPRESSIONS, impressions),
        (CTR, ctr),
        (POSITION, position),
    ];
    let missing: Vec<String> = required
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            export: PERFORMANCE_EXPORT,
            columns: missing,
        });
    }

    let mut rows = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let page_url = cell(&record, url);
        if page_url.is_empty() {
            continue;
        }
        rows.push(PerformanceRow {
            url: page_url.to_string(),
            clicks: parse_number(cell(&record, clicks)).unwrap_or(0.0),
            impressions: parse_number(cell(&record, impressions)).unwrap_or(0.0),
            ctr: parse_ctr(cell(&record, ctr)),
            position: parse_number(cell(&record, position)),
        });
    }

    Ok(rows)
}

/// Parse an internal link export into edges, one per row
pub fn read_links<R: Read>(reader: R) -> Result<Vec<LinkEdge>> {
    let mut csv_reader = csv_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let source = find_column(&headers, SOURCE);
    let destination = find_column(&headers, DESTINATION);
    let anchor = find_column(&headers, ANCHOR);
    let missing: Vec<String> = [(SOURCE, source), (DESTINATION, destination), (ANCHOR, anchor)]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LoadError::MissingColumns {
            export: LINK_EXPORT,
            columns: missing,
        });
    }

    let mut edges = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        edges.push(LinkEdge::new(
            cell(&record, source),
            cell(&record, destination),
            cell(&record, anchor),
        ));
    }
    Ok(edges)
}

/// Attach performance rows to pages with the same URL; returns the match count
///
/// When a URL appears more than once in the performance export, the first
/// row is used.
pub fn merge_performance(pages: &mut [Page], rows: &[PerformanceRow]) -> usize {
    let mut by_url: HashMap<&str, &PerformanceRow> = HashMap::new();
    for row in rows {
        by_url.entry(row.url.as_str()).or_insert(row);
    }

    let mut matched = 0;
    for page in pages.iter_mut() {
        if let Some(row) = by_url.get(page.url.as_str()) {
            page.performance = Some(Performance {
                impressions: row.impressions,
                clicks: row.clicks,
                ctr: row.ctr,
                position: row.position,
            });
            matched += 1;
        }
    }
    matched
}

// Helper functions

fn open(path: &Path) -> Result<File> {
    File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::Headers)
        .flexible(true)
        .from_reader(reader)
}

fn clean_header(header: &str) -> &str {
    header.trim_start_matches('\u{feff}').trim()
}

fn find_column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| clean_header(h).eq_ignore_ascii_case(name))
}

fn cell(record: &StringRecord, idx: Option<usize>) -> &str {
    idx.and_then(|i| record.get(i)).unwrap_or_default().trim()
}

/// Finite numbers only; `NaN` and `inf` cells count as unparseable
fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_count(raw: &str) -> u32 {
    match parse_number(raw) {
        Some(value) if value > 0.0 => value.round().min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

fn parse_status(raw: &str) -> Option<u16> {
    raw.parse::<u16>().ok().or_else(|| {
        parse_number(raw)
            .filter(|v| v.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(v))
            .map(|v| v as u16)
    })
}

/// CTR as a fraction; "4.5%" and "0.045" both give 0.045
fn parse_ctr(raw: &str) -> f64 {
    match raw.strip_suffix('%') {
        Some(percent) => parse_number(percent.trim()).map(|v| v / 100.0),
        None => parse_number(raw),
    }
    .unwrap_or(0.0)
}
