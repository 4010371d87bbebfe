// Priority scoring: which eligible pages most need internal links

use crate::config::{PotentialThresholds, PriorityWeights, WEIGHT_SUM_TOLERANCE};
use crate::eligibility::EligiblePages;
use crate::error::{EngineError, Result};
use crate::normalize::{NormalizedMetrics, NormalizedTable};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityScore {
    pub score: f64,
    pub has_potential: bool,
}

/// One scored page; `page_index` points into [`EligiblePages`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityEntry {
    pub page_index: usize,
    pub url: String,
    pub priority: PriorityScore,
    pub metrics: NormalizedMetrics,
}

/// Every eligible page, best candidate for more links first
#[derive(Debug, Clone, Default)]
pub struct PriorityRanking {
    entries: Vec<PriorityEntry>,
}

impl PriorityRanking {
    pub fn entries(&self) -> &[PriorityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The first `n` pages, the targets of the opportunity stage
    pub fn top(&self, n: usize) -> &[PriorityEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    pub fn get(&self, url: &str) -> Option<&PriorityEntry> {
        self.entries.iter().find(|e| e.url == url)
    }

    pub fn potential_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.priority.has_potential)
            .count()
    }
}

/// Weighted sum of the normalized metrics
pub fn priority_score(metrics: &NormalizedMetrics, weights: &PriorityWeights) -> f64 {
    metrics.impressions * weights.impressions
        + metrics.position * weights.position
        + metrics.link_weakness * weights.link_score
        + metrics.depth * weights.depth
}

/// Traffic potential coexisting with structural weakness
pub fn has_potential(
    metrics: &NormalizedMetrics,
    has_performance: bool,
    thresholds: &PotentialThresholds,
) -> bool {
    has_performance
        && metrics.traffic_signal() > thresholds.traffic_floor
        && metrics.link_weakness > thresholds.weakness_floor
}

/// Score and rank every eligible page
///
/// Fails before scoring anything when the weights do not sum to 1.0.
pub fn rank_pages(
    pages: &EligiblePages,
    normalized: &NormalizedTable,
    weights: &PriorityWeights,
    thresholds: &PotentialThresholds,
) -> Result<PriorityRanking> {
    let sum = weights.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(EngineError::configuration(
            "priority_weights",
            format!("weights must sum to 1.0, got {}", sum),
        ));
    }

    let mut entries: Vec<PriorityEntry> = pages
        .iter()
        .enumerate()
        .filter_map(|(idx, page)| {
            let metrics = *normalized.get(idx)?;
            Some(PriorityEntry {
                page_index: idx,
                url: page.url.clone(),
                priority: PriorityScore {
                    score: priority_score(&metrics, weights),
                    has_potential: has_potential(
                        &metrics,
                        page.performance.is_some(),
                        thresholds,
                    ),
                },
                metrics,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        descending(a.priority.score, b.priority.score)
            .then_with(|| {
                descending(
                    pages[a.page_index].impressions().unwrap_or(0.0),
                    pages[b.page_index].impressions().unwrap_or(0.0),
                )
            })
            .then_with(|| a.url.cmp(&b.url))
    });

    Ok(PriorityRanking { entries })
}

/// Descending comparison helper shared by the ranking stages
pub(crate) fn descending(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}
