use crate::eligibility::SkippedPage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a stage produced an empty result
///
/// Degenerate input never fails a run; the similarity and opportunity stages
/// return an empty, valid result tagged with one of these reasons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DegenerateInput {
    TooFewEligiblePages { count: usize },
    EmptyVocabulary,
    NoPriorityPages,
    NoCandidatePairs,
}

impl fmt::Display for DegenerateInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegenerateInput::TooFewEligiblePages { count } => write!(
                f,
                "at least 2 eligible pages are needed for similarity, found {}",
                count
            ),
            DegenerateInput::EmptyVocabulary => {
                write!(f, "no usable terms were found in the page URLs")
            }
            DegenerateInput::NoPriorityPages => write!(f, "no priority pages to link to"),
            DegenerateInput::NoCandidatePairs => write!(
                f,
                "no source page reaches the similarity threshold for any priority page"
            ),
        }
    }
}

/// Which pairs the similarity stage computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityScope {
    /// Every pair of eligible pages
    Full,
    /// Only pairs that involve a priority page
    PriorityTargets,
}

impl SimilarityScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityScope::Full => "full",
            SimilarityScope::PriorityTargets => "priority_targets",
        }
    }
}

/// Everything a run noticed but did not fail on
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub total_pages: usize,
    pub ineligible_pages: usize,
    pub skipped_pages: Vec<SkippedPage>,
    pub similarity_scope: Option<SimilarityScope>,
    pub similarity_empty: Option<DegenerateInput>,
    pub opportunities_empty: Option<DegenerateInput>,
}
