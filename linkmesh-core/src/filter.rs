// Presentation filters over the ranked outputs

use crate::eligibility::EligiblePages;
use crate::model::Page;
use crate::opportunity::Opportunity;
use crate::priority::PriorityEntry;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriorityFilter {
    pub min_impressions: Option<f64>,
    pub max_position: Option<f64>,
    pub potential_only: bool,
}

impl PriorityFilter {
    pub fn matches(&self, page: &Page, entry: &PriorityEntry) -> bool {
        if self.potential_only && !entry.priority.has_potential {
            return false;
        }
        if let Some(min) = self.min_impressions
            && page.impressions().unwrap_or(0.0) < min
        {
            return false;
        }
        if let Some(max) = self.max_position {
            // A page without a position only passes when no cap is set
            match page.position() {
                Some(position) if position <= max => {}
                _ => return false,
            }
        }
        true
    }

    /// Keep the matching entries, order preserved
    pub fn apply<'a>(
        &self,
        pages: &EligiblePages,
        entries: &'a [PriorityEntry],
    ) -> Vec<&'a PriorityEntry> {
        entries
            .iter()
            .filter(|entry| self.matches(&pages[entry.page_index], entry))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpportunityFilter {
    pub min_similarity: Option<f64>,
    pub min_source_link_score: Option<f64>,
}

impl OpportunityFilter {
    pub fn matches(&self, opportunity: &Opportunity) -> bool {
        self.min_similarity
            .is_none_or(|min| opportunity.similarity >= min)
            && self
                .min_source_link_score
                .is_none_or(|min| opportunity.source_link_score >= min)
    }

    pub fn apply<'a>(&self, opportunities: &'a [Opportunity]) -> Vec<&'a Opportunity> {
        opportunities.iter().filter(|o| self.matches(o)).collect()
    }
}
