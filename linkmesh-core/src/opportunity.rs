//! Link opportunity scoring.
//!
//! For every priority page, the candidate sources are the eligible pages
//! whose URL similarity with it reaches the threshold. Each pair is scored as
//!
//! ```text
//! w_strength   * normalized(source.link_score)
//! + w_similarity * similarity(source, target)
//! - w_outlinks   * outlink_saturation(source)
//! + w_need       * target_need(target)
//! ```
//!
//! and only the best `top_k_suggestions_per_page` sources are kept per target.

use crate::config::AnalysisConfig;
use crate::diagnostics::DegenerateInput;
use crate::eligibility::EligiblePages;
use crate::links::LinkGraph;
use crate::normalize::{Range, target_need};
use crate::priority::{PriorityEntry, descending};
use crate::similarity::SimilarityMatrix;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A suggested internal link from `source` to the priority page `target`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
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

/// Ranked opportunities, highest score first
#[derive(Debug, Clone, Default)]
pub struct OpportunityList {
    items: Vec<Opportunity>,
    degenerate: Option<DegenerateInput>,
}

impl OpportunityList {
    pub fn empty(reason: DegenerateInput) -> Self {
        Self {
            items: Vec::new(),
            degenerate: Some(reason),
        }
    }

    pub fn items(&self) -> &[Opportunity] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Set when the list is empty because of the input, not the config
    pub fn degenerate(&self) -> Option<&DegenerateInput> {
        self.degenerate.as_ref()
    }

    /// Suggestions for one target, best first
    pub fn for_target<'a>(&'a self, target: &'a str) -> impl Iterator<Item = &'a Opportunity> {
        self.items.iter().filter(move |o| o.target == target)
    }
}

/// Penalty in [0, 1] that reaches 1 once a page has `max_outlinks` links
pub fn outlink_saturation(outlinks: usize, max_outlinks: u32) -> f64 {
    if max_outlinks == 0 {
        return 1.0;
    }
    (outlinks as f64 / max_outlinks as f64).min(1.0)
}

/// Score every candidate pair and keep the top K sources per target
pub fn score_opportunities(
    pages: &EligiblePages,
    targets: &[PriorityEntry],
    matrix: &SimilarityMatrix,
    links: &LinkGraph,
    config: &AnalysisConfig,
) -> OpportunityList {
    if targets.is_empty() {
        return OpportunityList::empty(DegenerateInput::NoPriorityPages);
    }
    if let Some(reason) = matrix.degenerate() {
        return OpportunityList::empty(reason.clone());
    }

    let weights = &config.opportunity_weights;
    let threshold = config.min_similarity_threshold;
    let top_k = config.top_k_suggestions_per_page;

    let strength_range = Range::of(pages.iter().map(|p| p.link_score));
    let inlink_range = Range::of(pages.iter().map(|p| p.unique_inlinks as f64));

    let mut items = Vec::new();

    for target in targets {
        let target_page = &pages[target.page_index];
        let need = target_need(target_page.unique_inlinks, inlink_range);

        let mut candidates: Vec<Opportunity> = matrix
            .neighbours(target.page_index)
            .iter()
            .filter(|(_, sim)| *sim >= threshold)
            .filter_map(|&(source_idx, similarity)| {
                let source = &pages[source_idx];
                if source.url == target_page.url {
                    return None;
                }
                if config.skip_existing_links && links.contains(&source.url, &target_page.url) {
                    return None;
                }

                let strength = strength_range
                    .map(|r| r.scale(source.link_score))
                    .unwrap_or(0.0);
                let outlinks = links.outlinks(&source.url);
                let saturation = outlink_saturation(outlinks, config.max_outlinks_warning);

                let opportunity_score = weights.source_strength * strength
                    + weights.thematic_similarity * similarity
                    - weights.outlinks_penalty * saturation
                    + weights.target_need * need;

                Some(Opportunity {
                    source: source.url.clone(),
                    target: target_page.url.clone(),
                    opportunity_score,
                    similarity,
                    source_link_score: source.link_score,
                    source_outlinks: outlinks,
                    target_link_score: target_page.link_score,
                    target_priority_score: target.priority.score,
                    target_inlinks: target_page.unique_inlinks,
                    target_impressions: target_page.impressions(),
                    target_position: target_page.position(),
                })
            })
            .collect();

        candidates.sort_by(|a, b| {
            descending(a.opportunity_score, b.opportunity_score)
                .then_with(|| descending(a.similarity, b.similarity))
                .then_with(|| a.source.cmp(&b.source))
        });
        candidates.truncate(top_k);

        debug!(
            "{} source(s) kept for target '{}'",
            candidates.len(),
            target_page.url
        );
        items.extend(candidates);
    }

    items.sort_by(|a, b| {
        descending(a.opportunity_score, b.opportunity_score)
            .then_with(|| descending(a.similarity, b.similarity))
            .then_with(|| a.target.cmp(&b.target))
            .then_with(|| a.source.cmp(&b.source))
    });

    info!(
        "Scored {} link opportunities for {} priority page(s)",
        items.len(),
        targets.len()
    );

    if items.is_empty() {
        return OpportunityList::empty(DegenerateInput::NoCandidatePairs);
    }

    OpportunityList {
        items,
        degenerate: None,
    }
}
