// Site-wide statistics shown in the report overview

use crate::eligibility::EligiblePages;
use crate::links::LinkGraph;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SiteStatistics {
    pub total_pages: usize,
    pub eligible_pages: usize,
    pub ineligible_pages: usize,
    pub skipped_pages: usize,
    pub avg_link_score: f64,
    pub avg_depth: f64,
    pub avg_inlinks: f64,
    pub pages_with_performance: usize,
    pub total_impressions: f64,
    pub total_clicks: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_internal_links: Option<usize>,
    pub pages_with_potential: usize,
}

impl SiteStatistics {
    /// Averages are taken over the eligible pages only
    pub fn compute(
        total_pages: usize,
        eligible: &EligiblePages,
        ineligible_pages: usize,
        skipped_pages: usize,
        links: Option<&LinkGraph>,
        pages_with_potential: usize,
    ) -> Self {
        let count = eligible.len();
        let mean = |sum: f64| if count == 0 { 0.0 } else { sum / count as f64 };

        let link_sum: f64 = eligible.iter().map(|p| p.link_score).sum();
        let depth_sum: f64 = eligible.iter().map(|p| p.crawl_depth as f64).sum();
        let inlink_sum: f64 = eligible.iter().map(|p| p.unique_inlinks as f64).sum();

        let with_performance = eligible.iter().filter_map(|p| p.performance.as_ref());
        let (pages_with_performance, total_impressions, total_clicks) = with_performance
            .fold((0, 0.0, 0.0), |(n, impr, clicks), perf| {
                (n + 1, impr + perf.impressions, clicks + perf.clicks)
            });

        Self {
            total_pages,
            eligible_pages: count,
            ineligible_pages,
            skipped_pages,
            avg_link_score: mean(link_sum),
            avg_depth: mean(depth_sum),
            avg_inlinks: mean(inlink_sum),
            pages_with_performance,
            total_impressions,
            total_clicks,
            total_internal_links: links.map(LinkGraph::edge_count),
            pages_with_potential,
        }
    }
}
