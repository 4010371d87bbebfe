//! Metric normalization.
//!
//! Rescales the raw per-page metrics onto [0, 1] so the priority scorer can
//! combine them with plain weights. The orientation of every metric is chosen
//! so that 1.0 always means "this page needs links more":
//!
//! - impressions: more impressions → higher
//! - position: closer to position 1 → higher
//! - link score: weaker page → higher
//! - crawl depth: deeper page → higher

use crate::config::PositionWindow;
use crate::eligibility::EligiblePages;
use serde::{Deserialize, Serialize};

/// Value used when every page shares the same raw metric
pub const DEGENERATE_RANGE_VALUE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedMetrics {
    pub impressions: f64,
    pub position: f64,
    pub link_weakness: f64,
    pub depth: f64,
}

impl NormalizedMetrics {
    /// Strongest traffic signal, used to flag potential
    pub fn traffic_signal(&self) -> f64 {
        self.impressions.max(self.position)
    }
}

/// Normalized metrics aligned with the order of [`EligiblePages`]
#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    rows: Vec<NormalizedMetrics>,
}

impl NormalizedTable {
    pub fn get(&self, idx: usize) -> Option<&NormalizedMetrics> {
        self.rows.get(idx)
    }

    pub fn rows(&self) -> &[NormalizedMetrics] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Observed range of a metric across the eligible pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    /// Range over the values, `None` for an empty input
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values.into_iter().fold(None, |acc, v| match acc {
            None => Some(Range { min: v, max: v }),
            Some(r) => Some(Range {
                min: r.min.min(v),
                max: r.max.max(v),
            }),
        })
    }

    pub fn is_degenerate(&self) -> bool {
        self.max <= self.min
    }

    /// Min-max scale; a degenerate range yields the constant 0.5
    pub fn scale(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return DEGENERATE_RANGE_VALUE;
        }
        ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0)
    }

    /// Inverted min-max scale (lowest value → 1.0)
    pub fn scale_inverted(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            return DEGENERATE_RANGE_VALUE;
        }
        ((self.max - value) / (self.max - self.min)).clamp(0.0, 1.0)
    }
}

/// Normalize the four priority metrics for every eligible page
pub fn normalize_metrics(pages: &EligiblePages, window: &PositionWindow) -> NormalizedTable {
    // Pages without performance data count as zero impressions in the range
    let impressions_range = Range::of(pages.iter().map(|p| p.impressions().unwrap_or(0.0)));
    let link_range = Range::of(pages.iter().map(|p| p.link_score));
    let depth_range = Range::of(pages.iter().map(|p| p.crawl_depth as f64));

    let rows = pages
        .iter()
        .map(|page| {
            let impressions = match (page.impressions(), impressions_range) {
                (Some(value), Some(range)) => range.scale(value),
                _ => 0.0,
            };
            let position = page
                .position()
                .map(|p| normalize_position(p, window))
                .unwrap_or(0.0);
            let link_weakness = link_range
                .map(|r| r.scale_inverted(page.link_score))
                .unwrap_or(DEGENERATE_RANGE_VALUE);
            let depth = depth_range
                .map(|r| normalize_depth(page.crawl_depth, r))
                .unwrap_or(0.0);

            NormalizedMetrics {
                impressions,
                position,
                link_weakness,
                depth,
            }
        })
        .collect();

    NormalizedTable { rows }
}

/// Clamp into the plausible window then invert (window min → 1.0, max → 0.0)
pub fn normalize_position(position: f64, window: &PositionWindow) -> f64 {
    let span = window.max - window.min;
    if span <= 0.0 {
        return DEGENERATE_RANGE_VALUE;
    }
    let clamped = position.clamp(window.min, window.max);
    (window.max - clamped) / span
}

/// Depth relative to the deepest page; the homepage (depth 0) is always 0
pub fn normalize_depth(depth: u32, range: Range) -> f64 {
    if depth == 0 {
        return 0.0;
    }
    if range.is_degenerate() {
        return DEGENERATE_RANGE_VALUE;
    }
    (depth as f64 / range.max).clamp(0.0, 1.0)
}

/// Inverse min-max over `unique_inlinks` (fewer inlinks → higher need)
pub fn target_need(inlinks: u32, range: Option<Range>) -> f64 {
    range
        .map(|r| r.scale_inverted(inlinks as f64))
        .unwrap_or(DEGENERATE_RANGE_VALUE)
}
