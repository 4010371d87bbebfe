// Pipeline entry: split the loaded pages into the eligible view and the rest

use crate::error::{EngineError, Result};
use crate::model::Page;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::ops::Index;
use tracing::{debug, warn};

/// A page dropped because one of its fields was malformed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedPage {
    pub url: String,
    pub field: String,
    pub reason: String,
}

/// Immutable view over the pages every downstream stage works on
///
/// Order follows the input order with ineligible and malformed pages removed.
#[derive(Debug, Clone, Default)]
pub struct EligiblePages {
    pages: Vec<Page>,
    index: HashMap<String, usize>,
}

impl EligiblePages {
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter()
    }

    pub fn position_of(&self, url: &str) -> Option<usize> {
        self.index.get(url).copied()
    }

    pub fn get(&self, url: &str) -> Option<&Page> {
        self.position_of(url).map(|idx| &self.pages[idx])
    }

    pub fn contains(&self, url: &str) -> bool {
        self.index.contains_key(url)
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|p| p.url.as_str())
    }
}

impl Index<usize> for EligiblePages {
    type Output = Page;

    fn index(&self, idx: usize) -> &Page {
        &self.pages[idx]
    }
}

/// What the entry filter kept, excluded and skipped
#[derive(Debug, Clone, Default)]
pub struct Eligibility {
    pub eligible: EligiblePages,
    /// Pages with a non-200 status or marked non-indexable
    pub ineligible: usize,
    pub skipped: Vec<SkippedPage>,
}

/// Filter pages once at pipeline entry
///
/// Non-200 and non-indexable pages are excluded silently. Pages with
/// malformed fields are skipped and recorded; when the skipped share exceeds
/// `tolerance` the whole run fails.
pub fn filter_eligible(pages: Vec<Page>, tolerance: f64) -> Result<Eligibility> {
    let total = pages.len();
    let mut kept = Vec::with_capacity(total);
    let mut index = HashMap::with_capacity(total);
    let mut seen = HashSet::with_capacity(total);
    let mut skipped = Vec::new();
    let mut ineligible = 0;

    for page in pages {
        if let Some((field, reason)) = integrity_issue(&page) {
            warn!("Skipping page '{}': {} {}", page.url, field, reason);
            skipped.push(SkippedPage {
                url: page.url,
                field: field.to_string(),
                reason,
            });
            continue;
        }

        if !seen.insert(page.url.clone()) {
            warn!("Skipping duplicate page '{}'", page.url);
            skipped.push(SkippedPage {
                url: page.url,
                field: "url".to_string(),
                reason: "duplicate URL".to_string(),
            });
            continue;
        }

        if !page.is_eligible() {
            ineligible += 1;
            continue;
        }

        index.insert(page.url.clone(), kept.len());
        kept.push(page);
    }

    if total > 0 && !skipped.is_empty() {
        let share = skipped.len() as f64 / total as f64;
        if share > tolerance {
            let first = &skipped[0];
            return Err(EngineError::DataIntegrity {
                skipped: skipped.len(),
                total,
                tolerance,
                field: first.field.clone(),
                url: first.url.clone(),
            });
        }
    }

    debug!(
        "Eligibility: {} eligible, {} ineligible, {} skipped of {}",
        kept.len(),
        ineligible,
        skipped.len(),
        total
    );

    Ok(Eligibility {
        eligible: EligiblePages { pages: kept, index },
        ineligible,
        skipped,
    })
}

fn integrity_issue(page: &Page) -> Option<(&'static str, String)> {
    if page.url.trim().is_empty() {
        return Some(("url", "is empty".to_string()));
    }
    if !page.link_score.is_finite() {
        return Some(("link_score", format!("is not finite ({})", page.link_score)));
    }

    let performance = page.performance.as_ref()?;
    if !performance.impressions.is_finite() || performance.impressions < 0.0 {
        return Some((
            "impressions",
            format!("must be finite and non-negative ({})", performance.impressions),
        ));
    }
    if !performance.clicks.is_finite() || performance.clicks < 0.0 {
        return Some((
            "clicks",
            format!("must be finite and non-negative ({})", performance.clicks),
        ));
    }
    if !performance.ctr.is_finite() {
        return Some(("ctr", format!("is not finite ({})", performance.ctr)));
    }
    if let Some(position) = performance.position
        && !position.is_finite()
    {
        return Some(("position", format!("is not finite ({})", position)));
    }

    None
}
