//! Analysis configuration.
//!
//! Every run receives one validated [`AnalysisConfig`] value. Nothing in the
//! engine reads global state, so runs with different configurations can
//! execute side by side.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Allowed drift when checking that priority weights sum to 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityWeights {
    pub impressions: f64,
    pub position: f64,
    pub link_score: f64,
    pub depth: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            impressions: 0.3,
            position: 0.2,
            link_score: 0.3,
            depth: 0.2,
        }
    }
}

impl PriorityWeights {
    pub fn sum(&self) -> f64 {
        self.impressions + self.position + self.link_score + self.depth
    }

    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("priority_weights.impressions", self.impressions),
            ("priority_weights.position", self.position),
            ("priority_weights.link_score", self.link_score),
            ("priority_weights.depth", self.depth),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityWeights {
    pub source_strength: f64,
    pub thematic_similarity: f64,
    pub outlinks_penalty: f64,
    pub target_need: f64,
}

impl Default for OpportunityWeights {
    fn default() -> Self {
        Self {
            source_strength: 0.4,
            thematic_similarity: 0.4,
            outlinks_penalty: 0.1,
            target_need: 0.1,
        }
    }
}

impl OpportunityWeights {
    fn entries(&self) -> [(&'static str, f64); 4] {
        [
            ("opportunity_weights.source_strength", self.source_strength),
            ("opportunity_weights.thematic_similarity", self.thematic_similarity),
            ("opportunity_weights.outlinks_penalty", self.outlinks_penalty),
            ("opportunity_weights.target_need", self.target_need),
        ]
    }
}

/// Plausible range for average search position; values outside are clamped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PositionWindow {
    pub min: f64,
    pub max: f64,
}

impl Default for PositionWindow {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 100.0,
        }
    }
}

/// Floors used to flag pages with unexploited potential
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotentialThresholds {
    /// Normalized impressions or position signal must exceed this
    pub traffic_floor: f64,
    /// Normalized link score weakness must exceed this
    pub weakness_floor: f64,
}

impl Default for PotentialThresholds {
    fn default() -> Self {
        Self {
            traffic_floor: 0.5,
            weakness_floor: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// 1 = single terms, 2 = single terms plus adjacent pairs
    pub ngram_max: usize,
    /// Vocabulary cap, most frequent terms kept
    pub max_features: usize,
    /// Compute every pair instead of only pairs touching a priority page
    pub full_matrix: bool,
    /// Above this many eligible pages the full matrix is never computed
    pub full_matrix_page_limit: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            ngram_max: 2,
            max_features: 1000,
            full_matrix: false,
            full_matrix_page_limit: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub min_similarity_threshold: f64,
    pub max_outlinks_warning: u32,
    pub top_n_pages_to_boost: usize,
    pub top_k_suggestions_per_page: usize,
    pub skip_existing_links: bool,
    /// Share of malformed pages tolerated before the run fails
    pub data_integrity_tolerance: f64,
    // Tables last so the TOML output stays valid
    pub priority_weights: PriorityWeights,
    pub opportunity_weights: OpportunityWeights,
    pub position_window: PositionWindow,
    pub potential: PotentialThresholds,
    pub similarity: SimilarityConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            min_similarity_threshold: 0.1,
            max_outlinks_warning: 100,
            top_n_pages_to_boost: 50,
            top_k_suggestions_per_page: 10,
            skip_existing_links: false,
            data_integrity_tolerance: 0.1,
            priority_weights: PriorityWeights::default(),
            opportunity_weights: OpportunityWeights::default(),
            position_window: PositionWindow::default(),
            potential: PotentialThresholds::default(),
            similarity: SimilarityConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML document; missing keys fall back to defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AnalysisConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every value before a run starts
    pub fn validate(&self) -> Result<()> {
        for (field, value) in self
            .priority_weights
            .entries()
            .into_iter()
            .chain(self.opportunity_weights.entries())
        {
            ensure_non_negative(field, value)?;
        }

        let sum = self.priority_weights.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::configuration(
                "priority_weights",
                format!("weights must sum to 1.0, got {}", sum),
            ));
        }

        ensure_unit_interval("min_similarity_threshold", self.min_similarity_threshold)?;
        ensure_unit_interval("potential.traffic_floor", self.potential.traffic_floor)?;
        ensure_unit_interval("potential.weakness_floor", self.potential.weakness_floor)?;
        ensure_unit_interval("data_integrity_tolerance", self.data_integrity_tolerance)?;

        ensure_positive("max_outlinks_warning", self.max_outlinks_warning as usize)?;
        ensure_positive("top_n_pages_to_boost", self.top_n_pages_to_boost)?;
        ensure_positive("top_k_suggestions_per_page", self.top_k_suggestions_per_page)?;
        ensure_positive("similarity.max_features", self.similarity.max_features)?;
        ensure_positive(
            "similarity.full_matrix_page_limit",
            self.similarity.full_matrix_page_limit,
        )?;

        if !(1..=2).contains(&self.similarity.ngram_max) {
            return Err(EngineError::configuration(
                "similarity.ngram_max",
                format!("must be 1 or 2, got {}", self.similarity.ngram_max),
            ));
        }

        let window = &self.position_window;
        if !window.min.is_finite() || window.min < 1.0 {
            return Err(EngineError::configuration(
                "position_window.min",
                format!("must be at least 1, got {}", window.min),
            ));
        }
        if !window.max.is_finite() || window.max <= window.min {
            return Err(EngineError::configuration(
                "position_window.max",
                format!(
                    "must be greater than position_window.min ({}), got {}",
                    window.min, window.max
                ),
            ));
        }

        Ok(())
    }
}

fn ensure_non_negative(field: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(EngineError::configuration(
            field,
            format!("must be a finite, non-negative number, got {}", value),
        ));
    }
    Ok(())
}

fn ensure_unit_interval(field: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(EngineError::configuration(
            field,
            format!("must be within [0, 1], got {}", value),
        ));
    }
    Ok(())
}

fn ensure_positive(field: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(EngineError::configuration(field, "must be a positive integer"));
    }
    Ok(())
}
