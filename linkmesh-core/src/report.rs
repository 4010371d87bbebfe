// Report generation from an analysis run

use crate::analysis::Analysis;
use crate::diagnostics::RunDiagnostics;
use crate::error::Result;
use crate::filter::{OpportunityFilter, PriorityFilter};
use crate::model::Page;
use crate::opportunity::Opportunity;
use crate::priority::{PriorityEntry, descending};
use crate::similarity::SimilarityMatrix;
use crate::stats::SiteStatistics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const PRIORITY_CSV: &str = "priority_pages.csv";
pub const OPPORTUNITIES_CSV: &str = "link_opportunities.csv";
pub const SIMILARITY_CSV: &str = "similarity_matrix.csv";

const RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";
const THIN_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

/// A record that can be written as one CSV row
pub trait TableRow: Serialize {
    const HEADERS: &'static [&'static str];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityRow {
    pub url: String,
    pub priority_score: f64,
    pub has_potential: bool,
    pub link_score: f64,
    pub unique_inlinks: u32,
    pub crawl_depth: u32,
    pub impressions: Option<f64>,
    pub clicks: Option<f64>,
    pub position: Option<f64>,
}

impl PriorityRow {
    pub fn new(page: &Page, entry: &PriorityEntry) -> Self {
        Self {
            url: page.url.clone(),
            priority_score: entry.priority.score,
            has_potential: entry.priority.has_potential,
            link_score: page.link_score,
            unique_inlinks: page.unique_inlinks,
            crawl_depth: page.crawl_depth,
            impressions: page.impressions(),
            clicks: page.performance.as_ref().map(|p| p.clicks),
            position: page.position(),
        }
    }
}

impl TableRow for PriorityRow {
    const HEADERS: &'static [&'static str] = &[
        "url",
        "priority_score",
        "has_potential",
        "link_score",
        "unique_inlinks",
        "crawl_depth",
        "impressions",
        "clicks",
        "position",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRow {
    pub source: String,
    pub target: String,
    pub opportunity_score: f64,
    pub similarity: f64,
    pub source_link_score: f64,
    pub source_outlinks: usize,
    pub target_link_score: f64,
    pub target_priority_score: f64,
    pub target_inlinks: u32,
    pub target_impressions: Option<f64>,
    pub target_position: Option<f64>,
}

impl From<&Opportunity> for OpportunityRow {
    fn from(o: &Opportunity) -> Self {
        Self {
            source: o.source.clone(),
            target: o.target.clone(),
            opportunity_score: o.opportunity_score,
            similarity: o.similarity,
            source_link_score: o.source_link_score,
            source_outlinks: o.source_outlinks,
            target_link_score: o.target_link_score,
            target_priority_score: o.target_priority_score,
            target_inlinks: o.target_inlinks,
            target_impressions: o.target_impressions,
            target_position: o.target_position,
        }
    }
}

impl TableRow for OpportunityRow {
    const HEADERS: &'static [&'static str] = &[
        "source",
        "target",
        "opportunity_score",
        "similarity",
        "source_link_score",
        "source_outlinks",
        "target_link_score",
        "target_priority_score",
        "target_inlinks",
        "target_impressions",
        "target_position",
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityRow {
    pub url_a: String,
    pub url_b: String,
    pub similarity: f64,
}

impl TableRow for SimilarityRow {
    const HEADERS: &'static [&'static str] = &["url_a", "url_b", "similarity"];
}

/// Filters and switches applied when a report is gathered
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub priority_filter: PriorityFilter,
    pub opportunity_filter: OpportunityFilter,
    pub include_similarity: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub generated_at: String,
    pub statistics: SiteStatistics,
    pub diagnostics: RunDiagnostics,
    pub priority_target_count: usize,
    pub similarity_pairs: usize,
    pub priority_pages: Vec<PriorityRow>,
    pub opportunities: Vec<OpportunityRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<Vec<SimilarityRow>>,
}

/// Priority pages (top N) that pass the filter, ranked order
pub fn priority_rows(analysis: &Analysis, filter: &PriorityFilter) -> Vec<PriorityRow> {
    filter
        .apply(&analysis.eligible, analysis.priority_pages())
        .into_iter()
        .map(|entry| PriorityRow::new(&analysis.eligible[entry.page_index], entry))
        .collect()
}

/// Opportunities that pass the filter, ranked order
pub fn opportunity_rows(analysis: &Analysis, filter: &OpportunityFilter) -> Vec<OpportunityRow> {
    filter
        .apply(analysis.opportunities.items())
        .into_iter()
        .map(OpportunityRow::from)
        .collect()
}

/// Every stored pair of the matrix in canonical order
pub fn similarity_rows(matrix: &SimilarityMatrix) -> Vec<SimilarityRow> {
    matrix
        .iter()
        .map(|(a, b, similarity)| SimilarityRow {
            url_a: a.to_string(),
            url_b: b.to_string(),
            similarity,
        })
        .collect()
}

pub fn gather_report_data(
    analysis: &Analysis,
    options: &ReportOptions,
    generated_at: DateTime<Utc>,
) -> ReportData {
    ReportData {
        generated_at: generated_at.to_rfc3339(),
        statistics: analysis.statistics.clone(),
        diagnostics: analysis.diagnostics.clone(),
        priority_target_count: analysis.priority_target_count,
        similarity_pairs: analysis.similarity.len(),
        priority_pages: priority_rows(analysis, &options.priority_filter),
        opportunities: opportunity_rows(analysis, &options.opportunity_filter),
        similarity: options
            .include_similarity
            .then(|| similarity_rows(&analysis.similarity)),
    }
}

/// Write rows as CSV; the header line is written even for an empty table
pub fn write_csv<W: Write, T: TableRow>(writer: W, rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(T::HEADERS)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string<T: TableRow>(rows: &[T]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(&mut buffer, rows)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write the three tables into `dir`, returning the created paths
pub fn export_csv_tables(
    analysis: &Analysis,
    options: &ReportOptions,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let priority_path = dir.join(PRIORITY_CSV);
    write_csv(
        File::create(&priority_path)?,
        &priority_rows(analysis, &options.priority_filter),
    )?;

    let opportunities_path = dir.join(OPPORTUNITIES_CSV);
    write_csv(
        File::create(&opportunities_path)?,
        &opportunity_rows(analysis, &options.opportunity_filter),
    )?;

    let similarity_path = dir.join(SIMILARITY_CSV);
    write_csv(
        File::create(&similarity_path)?,
        &similarity_rows(&analysis.similarity),
    )?;

    Ok(vec![priority_path, opportunities_path, similarity_path])
}

pub fn render_report(data: &ReportData, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
        ReportFormat::Json => Ok(generate_json_report(data)?),
        ReportFormat::Csv => to_csv_string(&data.opportunities),
    }
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    // Header
    report.push_str(RULE);
    report.push_str("                       LINKMESH INTERNAL LINKING REPORT\n");
    report.push_str(RULE);
    report.push('\n');
    report.push_str(&format!("Generated:     {}\n", data.generated_at));
    report.push_str(&format!("Pages loaded:  {}\n", data.statistics.total_pages));
    report.push_str(&format!("Eligible:      {}\n", data.statistics.eligible_pages));
    report.push('\n');

    // Overview
    report.push_str(RULE);
    report.push_str("OVERVIEW\n");
    report.push_str(RULE);
    report.push('\n');
    let stats = &data.statistics;
    report.push_str(&format!("Average link score:      {:.2}\n", stats.avg_link_score));
    report.push_str(&format!("Average crawl depth:     {:.2}\n", stats.avg_depth));
    report.push_str(&format!("Average unique inlinks:  {:.2}\n", stats.avg_inlinks));
    report.push_str(&format!("Pages with search data:  {}\n", stats.pages_with_performance));
    report.push_str(&format!("Total impressions:       {:.0}\n", stats.total_impressions));
    report.push_str(&format!("Total clicks:            {:.0}\n", stats.total_clicks));
    if let Some(links) = stats.total_internal_links {
        report.push_str(&format!("Internal links:          {}\n", links));
    }
    report.push_str(&format!("Pages with potential:    {}\n", stats.pages_with_potential));
    report.push_str(&format!("Similar page pairs:      {}\n", data.similarity_pairs));
    report.push('\n');

    // Priority pages
    report.push_str(RULE);
    report.push_str(&format!(
        "PRIORITY PAGES ({} shown of top {})\n",
        data.priority_pages.len(),
        data.priority_target_count
    ));
    report.push_str(RULE);
    report.push('\n');

    if data.priority_pages.is_empty() {
        report.push_str("  (none)\n");
    }
    for (idx, row) in data.priority_pages.iter().enumerate() {
        let marker = if row.has_potential { "★" } else { " " };
        report.push_str(&format!(
            "{:>3}. {} {:.3}  {}\n",
            idx + 1,
            marker,
            row.priority_score,
            row.url
        ));
        report.push_str(&format!(
            "          link score {:.1} · inlinks {} · depth {} · impressions {} · position {}\n",
            row.link_score,
            row.unique_inlinks,
            row.crawl_depth,
            format_optional(row.impressions, 0),
            format_optional(row.position, 1),
        ));
    }
    report.push('\n');

    // Opportunities, grouped by target in priority order
    report.push_str(RULE);
    report.push_str(&format!("LINK OPPORTUNITIES ({})\n", data.opportunities.len()));
    report.push_str(RULE);
    report.push('\n');

    if data.opportunities.is_empty() {
        let reason = data
            .diagnostics
            .opportunities_empty
            .as_ref()
            .map(|r| r.to_string())
            .unwrap_or_else(|| "no opportunity passed the filters".to_string());
        report.push_str(&format!("  (none: {})\n\n", reason));
    }

    for target in grouped_targets(&data.opportunities) {
        report.push_str(&format!("→ {}\n", target));
        for row in data.opportunities.iter().filter(|o| o.target == target) {
            report.push_str(&format!(
                "    {:.3}  from {}  (similarity {:.2}, link score {:.1}, outlinks {})\n",
                row.opportunity_score,
                row.source,
                row.similarity,
                row.source_link_score,
                row.source_outlinks
            ));
        }
        report.push_str(THIN_RULE);
    }

    // Diagnostics
    if !data.diagnostics.skipped_pages.is_empty() || data.diagnostics.similarity_empty.is_some() {
        report.push('\n');
        report.push_str(RULE);
        report.push_str("DIAGNOSTICS\n");
        report.push_str(RULE);
        report.push('\n');
        if let Some(reason) = &data.diagnostics.similarity_empty {
            report.push_str(&format!("Similarity: {}\n", reason));
        }
        for skipped in &data.diagnostics.skipped_pages {
            report.push_str(&format!(
                "Skipped {}: {} {}\n",
                skipped.url, skipped.field, skipped.reason
            ));
        }
    }

    // Footer
    report.push('\n');
    report.push_str(RULE);
    report.push_str("                                End of Report\n");
    report.push_str(RULE);

    report
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# linkmesh internal linking report\n\n");
    report.push_str(&format!("_Generated {}_\n\n", data.generated_at));

    report.push_str("## Overview\n\n");
    report.push_str("| Metric | Value |\n|---|---|\n");
    let stats = &data.statistics;
    report.push_str(&format!("| Pages loaded | {} |\n", stats.total_pages));
    report.push_str(&format!("| Eligible pages | {} |\n", stats.eligible_pages));
    report.push_str(&format!("| Average link score | {:.2} |\n", stats.avg_link_score));
    report.push_str(&format!("| Average crawl depth | {:.2} |\n", stats.avg_depth));
    report.push_str(&format!("| Pages with search data | {} |\n", stats.pages_with_performance));
    report.push_str(&format!("| Total impressions | {:.0} |\n", stats.total_impressions));
    report.push_str(&format!("| Pages with potential | {} |\n", stats.pages_with_potential));
    report.push('\n');

    report.push_str("## Priority pages\n\n");
    report.push_str(
        "| # | URL | Score | Potential | Link score | Inlinks | Depth | Impressions | Position |\n",
    );
    report.push_str("|---|---|---|---|---|---|---|---|---|\n");
    for (idx, row) in data.priority_pages.iter().enumerate() {
        report.push_str(&format!(
            "| {} | {} | {:.3} | {} | {:.1} | {} | {} | {} | {} |\n",
            idx + 1,
            escape_markdown(&row.url),
            row.priority_score,
            if row.has_potential { "yes" } else { "no" },
            row.link_score,
            row.unique_inlinks,
            row.crawl_depth,
            format_optional(row.impressions, 0),
            format_optional(row.position, 1),
        ));
    }
    report.push('\n');

    report.push_str("## Link opportunities\n\n");
    if data.opportunities.is_empty() {
        if let Some(reason) = &data.diagnostics.opportunities_empty {
            report.push_str(&format!("No opportunities: {}.\n\n", reason));
        } else {
            report.push_str("No opportunities passed the filters.\n\n");
        }
        return report;
    }
    report.push_str(
        "| Source | Target | Score | Similarity | Source link score | Source outlinks |\n",
    );
    report.push_str("|---|---|---|---|---|---|\n");
    for row in &data.opportunities {
        report.push_str(&format!(
            "| {} | {} | {:.3} | {:.2} | {:.1} | {} |\n",
            escape_markdown(&row.source),
            escape_markdown(&row.target),
            row.opportunity_score,
            row.similarity,
            row.source_link_score,
            row.source_outlinks
        ));
    }
    report.push('\n');

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "linkmesh",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at,
                "format": "json"
            },
            "summary": data.statistics,
            "diagnostics": data.diagnostics,
            "priority_target_count": data.priority_target_count,
            "priority_pages": data.priority_pages,
            "opportunities": data.opportunities,
            "similarity": data.similarity.as_ref().map(|rows| {
                serde_json::json!({
                    "total_pairs": rows.len(),
                    "pairs": rows
                })
            })
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

// Helper functions

/// Targets in priority order, using the same keys as the priority ranking
fn grouped_targets(rows: &[OpportunityRow]) -> Vec<&str> {
    let mut targets: Vec<&OpportunityRow> = Vec::new();
    for row in rows {
        if !targets.iter().any(|t| t.target == row.target) {
            targets.push(row);
        }
    }
    targets.sort_by(|a, b| {
        descending(a.target_priority_score, b.target_priority_score)
            .then_with(|| {
                descending(
                    a.target_impressions.unwrap_or(0.0),
                    b.target_impressions.unwrap_or(0.0),
                )
            })
            .then_with(|| a.target.cmp(&b.target))
    });
    targets.into_iter().map(|row| row.target.as_str()).collect()
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

fn escape_markdown(text: &str) -> String {
    text.replace('|', "\\|")
}
