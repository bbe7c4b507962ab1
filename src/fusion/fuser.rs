//! The record fuser: merges tagged inputs into one composite record

use super::constants::{
    frequency_locked, golden_ratio, COHERENCE_THRESHOLD, DEFAULT_BASE_FREQUENCY, HARMONIC_COUNT,
    QUALITY_MARGIN, REFERENCE_FREQUENCY,
};
use super::merge::{merge_attrs, MismatchPolicy};
use super::normalize::normalize;
use crate::ids::short_id;
use crate::record::{AttrValue, Attrs, CompositeRecord, InputRecord};
use serde::{Deserialize, Serialize};
use std::f64::consts::{E, PI};
use thiserror::Error;
use tracing::{debug, info};

/// Errors surfaced by fusion
///
/// Fusion either succeeds or rejects its input outright; there is no
/// zero-score sentinel for an empty input list.
#[derive(Debug, Clone, Error)]
pub enum FuseError {
    #[error("no input records provided for fusion")]
    EmptyInput,
}

/// Fuser configuration
#[derive(Debug, Clone)]
pub struct FuserConfig {
    /// Base resonance frequency stamped on every composite
    pub base_frequency: f64,
    /// Resolution for kind-mismatched keys during merge
    pub mismatch_policy: MismatchPolicy,
    /// Minimum coherence for a composite to count as compatible
    pub coherence_threshold: f64,
}

impl Default for FuserConfig {
    fn default() -> Self {
        Self {
            base_frequency: DEFAULT_BASE_FREQUENCY,
            mismatch_policy: MismatchPolicy::default(),
            coherence_threshold: COHERENCE_THRESHOLD,
        }
    }
}

impl FuserConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_frequency(mut self, base_frequency: f64) -> Self {
        self.base_frequency = base_frequency;
        self
    }

    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }
}

/// Aggregate fuser statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FuserStatus {
    pub base_frequency: f64,
    pub fuse_count: u64,
    pub average_coherence: f64,
    pub coherence_threshold: f64,
}

/// Merges tagged input records into composite records
///
/// Stateless across calls except for aggregate counters used in
/// [`FuserStatus`] reporting.
#[derive(Debug, Clone)]
pub struct RecordFuser {
    config: FuserConfig,
    fuse_count: u64,
    total_coherence: f64,
}

impl Default for RecordFuser {
    fn default() -> Self {
        Self::new(FuserConfig::default())
    }
}

impl RecordFuser {
    pub fn new(config: FuserConfig) -> Self {
        Self {
            config,
            fuse_count: 0,
            total_coherence: 0.0,
        }
    }

    pub fn config(&self) -> &FuserConfig {
        &self.config
    }

    /// Fuse the inputs into a single composite record
    ///
    /// Inputs are normalized independently, then merged strictly
    /// left-to-right. The result is stamped with resonance attributes and
    /// a coherence score.
    pub fn fuse(&mut self, inputs: &[InputRecord]) -> Result<CompositeRecord, FuseError> {
        if inputs.is_empty() {
            return Err(FuseError::EmptyInput);
        }

        let fusion_id = short_id("fuse");
        debug!(%fusion_id, inputs = inputs.len(), "starting fusion");

        let base = self.config.base_frequency;
        let mut attrs = normalize(&inputs[0], base);
        let mut contributed = 1_i64;

        for input in &inputs[1..] {
            let next = normalize(input, base);
            merge_attrs(&mut attrs, next, self.config.mismatch_policy);
            contributed += 1;
            attrs.insert("synthesis_count".into(), AttrValue::Int(contributed));
            attrs.insert(
                "synthesis_ratio".into(),
                AttrValue::Float(golden_ratio()),
            );
        }

        self.apply_resonance(&mut attrs);

        let coherence = self.score_coherence(&attrs);
        attrs.insert("coherence_score".into(), AttrValue::Float(coherence));
        attrs.insert("input_count".into(), AttrValue::Int(inputs.len() as i64));

        self.fuse_count += 1;
        self.total_coherence += coherence;

        info!(%fusion_id, coherence = %format!("{coherence:.3}"), "fusion complete");

        Ok(CompositeRecord::new(fusion_id, attrs))
    }

    /// Stamp derived frequency and resonance attributes onto merged attrs
    fn apply_resonance(&self, attrs: &mut Attrs) {
        let base = self.config.base_frequency;
        let phi = golden_ratio();

        attrs.insert("resonance_frequency".into(), AttrValue::Float(base));
        attrs.insert("harmonic_ratio".into(), AttrValue::Float(phi));
        attrs.insert("pi_factor".into(), AttrValue::Float(PI));
        attrs.insert("e_factor".into(), AttrValue::Float(E));
        attrs.insert(
            "frequency_signature".into(),
            AttrValue::from(format!("{base:.1}Hz")),
        );
        attrs.insert(
            "pitch_ratio".into(),
            AttrValue::Float(base / REFERENCE_FREQUENCY),
        );
        attrs.insert(
            "harmonic_series".into(),
            AttrValue::Array(
                (1..=HARMONIC_COUNT)
                    .map(|i| AttrValue::Float(base * i as f64))
                    .collect(),
            ),
        );
        // Normalized into [0.8, 0.95]
        attrs.insert(
            "harmonic_stability".into(),
            AttrValue::Float(0.8 + (phi / PI) * 0.15),
        );
        attrs.insert(
            "coherence_potential".into(),
            AttrValue::Float(self.coherence_potential(attrs)),
        );

        attrs.insert("fusion_compatible".into(), AttrValue::Bool(true));
        attrs.insert("pipeline_compatible".into(), AttrValue::Bool(true));
        attrs.insert("ready".into(), AttrValue::Bool(true));

        let mut metadata = match attrs.remove("metadata") {
            Some(AttrValue::Map(m)) => m,
            _ => Attrs::new(),
        };
        metadata.insert("fusion_applied".into(), AttrValue::Bool(true));
        metadata.insert("resonance_applied".into(), AttrValue::Bool(true));
        metadata.insert("quality_margin".into(), AttrValue::Float(QUALITY_MARGIN));
        attrs.insert("metadata".into(), AttrValue::Map(metadata));
    }

    fn coherence_potential(&self, attrs: &Attrs) -> f64 {
        let mut potential: f64 = 0.90;
        if attrs.contains_key("harmonic_series") {
            potential += 0.02;
        }
        if attrs.contains_key("coordinates") {
            potential += 0.01;
        }
        potential.min(0.99)
    }

    /// Coherence score for a stamped attribute set, capped below 1.0 to
    /// preserve the reserved quality margin
    fn score_coherence(&self, attrs: &Attrs) -> f64 {
        let mut score: f64 = 0.85;

        if let Some(freq) = attrs.get("resonance_frequency").and_then(AttrValue::as_f64) {
            if frequency_locked(freq, self.config.base_frequency) {
                score += 0.05;
            }
        }
        if let Some(ratio) = attrs.get("harmonic_ratio").and_then(AttrValue::as_f64) {
            if (ratio - golden_ratio()).abs() < 0.01 {
                score += 0.05;
            }
        }
        if flag(attrs, "fusion_compatible") {
            score += 0.03;
        }
        if flag(attrs, "pipeline_compatible") {
            score += 0.02;
        }

        score.min(0.99)
    }

    /// Validate a composite for downstream grading
    ///
    /// Checks required attributes, the frequency lock, the coherence
    /// threshold, and the compatibility marker. Failures are logged and
    /// reported as `false`, never raised.
    pub fn validate(&self, record: &CompositeRecord) -> bool {
        for key in ["content", "resonance_frequency", "coordinates"] {
            if !record.contains(key) {
                debug!(fusion_id = %record.fusion_id, key, "validation failed: missing attribute");
                return false;
            }
        }

        let frequency = record.number("resonance_frequency").unwrap_or(0.0);
        if !frequency_locked(frequency, self.config.base_frequency) {
            debug!(
                fusion_id = %record.fusion_id,
                drift = (frequency - self.config.base_frequency).abs(),
                "validation failed: frequency drift"
            );
            return false;
        }

        if record.coherence() < self.config.coherence_threshold {
            debug!(
                fusion_id = %record.fusion_id,
                coherence = record.coherence(),
                "validation failed: low coherence"
            );
            return false;
        }

        if !record.is_compatible() {
            debug!(fusion_id = %record.fusion_id, "validation failed: not compatible");
            return false;
        }

        true
    }

    /// Aggregate statistics for this fuser instance
    pub fn status(&self) -> FuserStatus {
        let average = if self.fuse_count > 0 {
            self.total_coherence / self.fuse_count as f64
        } else {
            0.0
        };
        FuserStatus {
            base_frequency: self.config.base_frequency,
            fuse_count: self.fuse_count,
            average_coherence: average,
            coherence_threshold: self.config.coherence_threshold,
        }
    }
}

fn flag(attrs: &Attrs, key: &str) -> bool {
    attrs.get(key).map(AttrValue::is_truthy).unwrap_or(false)
}
