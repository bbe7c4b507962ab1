//! Pipeline stages and per-stage results

use crate::fusion::constants::{golden_ratio, QUALITY_MARGIN};
use crate::record::Attrs;
use serde::{Deserialize, Serialize};

/// The seven fixed grading stages, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Initial record preparation and compatibility assessment
    Prepare,
    /// Content compression and size-derived scoring
    Compress,
    /// Harmonic and field integration depth
    Integrate,
    /// Stability and coherence flow dynamics
    Flow,
    /// Ratio-derived temperature adjustment
    Temper,
    /// Quality indicator sampling
    Sample,
    /// Final readiness and range self-check
    Finalize,
}

impl Stage {
    /// All stages in their fixed evaluation order
    pub const ALL: [Stage; 7] = [
        Stage::Prepare,
        Stage::Compress,
        Stage::Integrate,
        Stage::Flow,
        Stage::Temper,
        Stage::Sample,
        Stage::Finalize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Prepare => "prepare",
            Stage::Compress => "compress",
            Stage::Integrate => "integrate",
            Stage::Flow => "flow",
            Stage::Temper => "temper",
            Stage::Sample => "sample",
            Stage::Finalize => "finalize",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Stage::Prepare => "Initial record preparation and compatibility assessment",
            Stage::Compress => "Content compression and meaning extraction",
            Stage::Integrate => "Deep record integration and harmonic infusion",
            Stage::Flow => "Record flow and resonance distribution",
            Stage::Temper => "Harmonic temperature adjustment and stability control",
            Stage::Sample => "Quality sampling and indicator validation",
            Stage::Finalize => "Final presentation and delivery preparation",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Stage::ALL.iter().copied().find(|s| s.name() == name)
    }

    /// Base score granted before any bonuses
    pub fn base(&self) -> f64 {
        match self {
            Stage::Prepare => 0.90,
            Stage::Compress => 0.89,
            Stage::Integrate => 0.91,
            Stage::Flow => 0.88,
            Stage::Temper => 0.90,
            Stage::Sample => 0.92,
            Stage::Finalize => 0.90,
        }
    }

    /// Upper bound on the stage score, bonuses included
    pub fn cap(&self) -> f64 {
        match self {
            Stage::Flow => 0.93,
            Stage::Temper => 0.94,
            _ => 0.95,
        }
    }

    /// Fixed aggregation weight; integration carries the most
    pub fn weight(&self) -> f64 {
        match self {
            Stage::Prepare => 1.0,
            Stage::Compress => 1.1,
            Stage::Integrate => 1.3,
            Stage::Flow => 1.2,
            Stage::Temper => 1.1,
            Stage::Sample => 1.0,
            Stage::Finalize => 1.2,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Outcome of evaluating one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Complete,
    UnknownStage,
}

/// Score and metadata for one evaluated stage
///
/// Created fresh per evaluation and read-only afterward. Carries the
/// fixed constants for traceability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage: String,
    pub status: StageStatus,
    pub score: f64,
    /// Stage-specific qualitative flags
    pub details: Attrs,
    pub processing_seconds: f64,
    pub phi_factor: f64,
    pub quality_margin: f64,
}

impl StageResult {
    pub(crate) fn complete(stage: Stage, score: f64, details: Attrs, seconds: f64) -> Self {
        Self {
            stage: stage.name().to_string(),
            status: StageStatus::Complete,
            score,
            details,
            processing_seconds: seconds,
            phi_factor: golden_ratio(),
            quality_margin: QUALITY_MARGIN,
        }
    }

    /// Zero-score result for a stage name outside the fixed seven
    pub(crate) fn unknown(name: &str) -> Self {
        Self {
            stage: name.to_string(),
            status: StageStatus::UnknownStage,
            score: 0.0,
            details: Attrs::new(),
            processing_seconds: 0.0,
            phi_factor: golden_ratio(),
            quality_margin: QUALITY_MARGIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_order_and_names() {
        let names: Vec<_> = Stage::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(
            names,
            [
                "prepare",
                "compress",
                "integrate",
                "flow",
                "temper",
                "sample",
                "finalize"
            ]
        );
    }

    #[test]
    fn test_from_name_round_trip() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_name(stage.name()), Some(stage));
        }
        assert_eq!(Stage::from_name("ferment"), None);
    }

    #[test]
    fn test_bounds_are_sane() {
        for stage in Stage::ALL {
            assert!(stage.base() < stage.cap());
            assert!(stage.weight() >= 1.0);
        }
    }

    #[test]
    fn test_unknown_result_scores_zero() {
        let result = StageResult::unknown("ferment");
        assert_eq!(result.score, 0.0);
        assert_eq!(result.status, StageStatus::UnknownStage);
    }
}
