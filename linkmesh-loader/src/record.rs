use linkmesh_core::{AnalysisInput, LinkEdge, Page};
use serde::{Deserialize, Serialize};

/// One row of the search performance export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRow {
    pub url: String,
    pub clicks: f64,
    pub impressions: f64,
    pub ctr: f64,
    pub position: Option<f64>,
}

/// What happened while the exports were read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadSummary {
    pub crawl_rows: usize,
    pub rejected_rows: usize,
    pub defaulted_columns: Vec<String>,
    pub performance_rows: usize,
    pub matched_performance: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_rows: Option<usize>,
}

impl LoadSummary {
    pub fn unmatched_performance(&self) -> usize {
        self.performance_rows.saturating_sub(self.matched_performance)
    }
}

/// Merged export data, ready for analysis
#[derive(Debug, Clone, Default)]
pub struct LoadedExports {
    pub pages: Vec<Page>,
    pub edges: Option<Vec<LinkEdge>>,
    pub summary: LoadSummary,
}

impl LoadedExports {
    pub fn into_input(self) -> AnalysisInput {
        let input = AnalysisInput::new(self.pages);
        match self.edges {
            Some(edges) => input.with_edges(edges),
            None => input,
        }
    }
}
