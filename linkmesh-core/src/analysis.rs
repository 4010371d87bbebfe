use crate::config::AnalysisConfig;
use crate::diagnostics::RunDiagnostics;
use crate::eligibility::{EligiblePages, filter_eligible};
use crate::error::{EngineError, Result};
use crate::links::LinkGraph;
use crate::model::{LinkEdge, Page};
use crate::normalize::{NormalizedTable, normalize_metrics};
use crate::opportunity::{OpportunityList, score_opportunities};
use crate::priority::{PriorityEntry, PriorityRanking, rank_pages};
use crate::similarity::{PairScope, SimilarityMatrix, compute_similarity};
use crate::stats::SiteStatistics;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Callback for reporting analysis progress
pub type AnalysisProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Cooperative cancellation flag, checked at the start of every stage
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Eligibility,
    Normalize,
    Priority,
    Similarity,
    Opportunity,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Eligibility => "eligibility",
            Stage::Normalize => "normalize",
            Stage::Priority => "priority",
            Stage::Similarity => "similarity",
            Stage::Opportunity => "opportunity",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Stage::Eligibility => "Filtering eligible pages...",
            Stage::Normalize => "Normalizing page metrics...",
            Stage::Priority => "Scoring priority pages...",
            Stage::Similarity => "Computing URL similarity...",
            Stage::Opportunity => "Scoring link opportunities...",
        }
    }
}

/// Validated export data handed over by the loader
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub pages: Vec<Page>,
    pub edges: Option<Vec<LinkEdge>>,
}

impl AnalysisInput {
    pub fn new(pages: Vec<Page>) -> Self {
        Self { pages, edges: None }
    }

    pub fn with_edges(mut self, edges: Vec<LinkEdge>) -> Self {
        self.edges = Some(edges);
        self
    }
}

/// Options for a single analysis run
#[derive(Clone, Default)]
pub struct AnalysisOptions {
    pub cancel: Option<CancellationToken>,
    pub progress: Option<AnalysisProgressCallback>,
}

impl AnalysisOptions {
    fn enter(&self, stage: Stage) -> Result<()> {
        if let Some(cancel) = &self.cancel
            && cancel.is_cancelled()
        {
            warn!("Analysis cancelled before stage {}", stage.as_str());
            return Err(EngineError::Cancelled {
                stage: stage.as_str().to_string(),
            });
        }
        if let Some(progress) = &self.progress {
            progress(stage.message().to_string());
        }
        Ok(())
    }
}

/// Everything one run derived from its input
#[derive(Debug, Clone)]
pub struct Analysis {
    pub eligible: EligiblePages,
    pub normalized: NormalizedTable,
    pub ranking: PriorityRanking,
    pub priority_target_count: usize,
    pub similarity: SimilarityMatrix,
    pub opportunities: OpportunityList,
    pub diagnostics: RunDiagnostics,
    pub statistics: SiteStatistics,
}

impl Analysis {
    /// The top N ranked pages, the targets of the opportunity stage
    pub fn priority_pages(&self) -> &[PriorityEntry] {
        self.ranking.top(self.priority_target_count)
    }
}

/// Run the full pipeline: eligibility → normalize → priority → similarity → opportunity
///
/// The configuration is validated before anything is computed. A run either
/// returns a complete [`Analysis`] or fails outright.
pub fn run_analysis(
    input: AnalysisInput,
    config: &AnalysisConfig,
    options: &AnalysisOptions,
) -> Result<Analysis> {
    config.validate()?;

    let AnalysisInput { pages, edges } = input;
    let total_pages = pages.len();
    let has_edges = edges.is_some();
    let link_graph = edges
        .as_deref()
        .map(LinkGraph::from_edges)
        .unwrap_or_default();

    info!(
        "Starting analysis of {} page(s), {} link(s)",
        total_pages,
        link_graph.edge_count()
    );

    options.enter(Stage::Eligibility)?;
    let eligibility = filter_eligible(pages, config.data_integrity_tolerance)?;
    let eligible = eligibility.eligible;

    options.enter(Stage::Normalize)?;
    let normalized = normalize_metrics(&eligible, &config.position_window);

    options.enter(Stage::Priority)?;
    let ranking = rank_pages(
        &eligible,
        &normalized,
        &config.priority_weights,
        &config.potential,
    )?;
    let priority_target_count = config.top_n_pages_to_boost.min(ranking.len());
    let targets = ranking.top(priority_target_count);

    options.enter(Stage::Similarity)?;
    let scope = similarity_scope(&eligible, targets, config);
    let similarity = compute_similarity(
        &eligible,
        &config.similarity,
        config.min_similarity_threshold,
        &scope,
    );

    options.enter(Stage::Opportunity)?;
    let opportunities = score_opportunities(&eligible, targets, &similarity, &link_graph, config);

    let statistics = SiteStatistics::compute(
        total_pages,
        &eligible,
        eligibility.ineligible,
        eligibility.skipped.len(),
        has_edges.then_some(&link_graph),
        ranking.potential_count(),
    );

    let diagnostics = RunDiagnostics {
        total_pages,
        ineligible_pages: eligibility.ineligible,
        skipped_pages: eligibility.skipped,
        similarity_scope: Some(similarity.scope()),
        similarity_empty: similarity.degenerate().cloned(),
        opportunities_empty: opportunities.degenerate().cloned(),
    };

    info!(
        "Analysis complete: {} eligible page(s), {} priority page(s), {} opportunity(ies)",
        eligible.len(),
        priority_target_count,
        opportunities.len()
    );

    Ok(Analysis {
        eligible,
        normalized,
        ranking,
        priority_target_count,
        similarity,
        opportunities,
        diagnostics,
        statistics,
    })
}

/// Full matrix only when asked for and the site is small enough
fn similarity_scope(
    eligible: &EligiblePages,
    targets: &[PriorityEntry],
    config: &AnalysisConfig,
) -> PairScope {
    let settings = &config.similarity;
    if settings.full_matrix {
        if eligible.len() <= settings.full_matrix_page_limit {
            return PairScope::All;
        }
        warn!(
            "{} eligible pages exceed full_matrix_page_limit ({}); computing priority pairs only",
            eligible.len(),
            settings.full_matrix_page_limit
        );
    }
    PairScope::Involving(targets.iter().map(|t| t.page_index).collect())
}
