//! Stage evaluation: one scoring function per pipeline stage
//!
//! Every scorer starts from the stage's documented base score and adds
//! independent bonuses for attributes probed on the composite record,
//! capped at the stage's upper bound. Missing attributes contribute no
//! bonus; nothing here can fail on malformed input.

use super::stage::{Stage, StageResult};
use crate::fusion::constants::{frequency_locked, golden_ratio};
use crate::record::{AttrValue, Attrs, CompositeRecord};
use std::f64::consts::PI;
use std::time::Instant;
use tracing::debug;

/// Evaluates composite records against the fixed stages
#[derive(Debug, Clone)]
pub struct StageEvaluator {
    base_frequency: f64,
    /// Nominal score range used by the finalize self-check
    nominal_range: (f64, f64),
}

impl StageEvaluator {
    pub fn new(base_frequency: f64, nominal_range: (f64, f64)) -> Self {
        Self {
            base_frequency,
            nominal_range,
        }
    }

    /// Evaluate a stage by name
    ///
    /// A name outside the fixed seven yields a zero-score result with
    /// status `unknown_stage`; the pipeline continues and the aggregate
    /// absorbs the penalty.
    pub fn evaluate(&self, stage_name: &str, record: &CompositeRecord) -> StageResult {
        match Stage::from_name(stage_name) {
            Some(stage) => self.evaluate_stage(stage, record),
            None => {
                debug!(stage = stage_name, "unknown stage requested");
                StageResult::unknown(stage_name)
            }
        }
    }

    /// Evaluate one known stage; reads the record, never mutates it
    pub fn evaluate_stage(&self, stage: Stage, record: &CompositeRecord) -> StageResult {
        let start = Instant::now();
        let (score, details) = match stage {
            Stage::Prepare => self.score_prepare(record),
            Stage::Compress => self.score_compress(record),
            Stage::Integrate => self.score_integrate(record),
            Stage::Flow => self.score_flow(record),
            Stage::Temper => self.score_temper(record),
            Stage::Sample => self.score_sample(record),
            Stage::Finalize => self.score_finalize(record),
        };
        let capped = score.min(stage.cap());
        debug!(stage = stage.name(), score = %format!("{capped:.4}"), "stage evaluated");
        StageResult::complete(stage, capped, details, start.elapsed().as_secs_f64())
    }

    fn score_prepare(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Prepare.base();

        if record.flag("fusion_compatible") {
            score += 0.02;
        }
        if record.flag("pipeline_compatible") {
            score += 0.02;
        }
        let frequency = record.number("resonance_frequency");
        if let Some(freq) = frequency {
            if frequency_locked(freq, self.base_frequency) {
                score += 0.02;
            }
        }

        let mut details = Attrs::new();
        details.insert(
            "fusion_marker".into(),
            AttrValue::Bool(record.flag("fusion_compatible")),
        );
        details.insert(
            "pipeline_marker".into(),
            AttrValue::Bool(record.flag("pipeline_compatible")),
        );
        details.insert(
            "frequency_lock".into(),
            AttrValue::Float(frequency.unwrap_or(0.0)),
        );
        (score, details)
    }

    fn score_compress(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Compress.base();

        let content_length = record
            .get("content")
            .map(|c| c.to_compact_string().len())
            .unwrap_or(0);
        if content_length > 0 {
            score += (content_length as f64 / 1000.0).min(0.05);
        }
        if record.contains("symbolic_mapping") {
            score += 0.02;
        }
        if record.contains("coordinates") {
            score += 0.01;
        }

        let mut details = Attrs::new();
        details.insert(
            "content_length".into(),
            AttrValue::Int(content_length as i64),
        );
        details.insert(
            "symbolic_mapping".into(),
            AttrValue::Bool(record.contains("symbolic_mapping")),
        );
        (score, details)
    }

    fn score_integrate(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Integrate.base();

        if record.contains("harmonic_series") {
            score += 0.02;
        }
        if record.contains("field_integration") {
            score += 0.01;
        }
        let fusion_applied = nested_flag(record, "metadata", "fusion_applied");
        if fusion_applied {
            score += 0.01;
        }

        let mut details = Attrs::new();
        details.insert("integration_depth".into(), AttrValue::from("deep"));
        details.insert("harmonic_infusion".into(), AttrValue::Bool(fusion_applied));
        (score, details)
    }

    fn score_flow(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Flow.base();

        if let Some(stability) = record.number("harmonic_stability") {
            score += stability * 0.05;
        }
        if let Some(coherence) = record.number("coherence_score") {
            score += coherence * 0.03;
        }

        let mut details = Attrs::new();
        details.insert(
            "stream_coherence".into(),
            AttrValue::Float(record.number("coherence_score").unwrap_or(0.85)),
        );
        details.insert("distribution".into(), AttrValue::from("uniform"));
        (score, details)
    }

    fn score_temper(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Temper.base();

        let temperature_stability = golden_ratio() / PI;
        score += temperature_stability * 0.1;
        if record.flag("frequency_signature") {
            score += 0.02;
        }

        let mut details = Attrs::new();
        details.insert(
            "temperature_stability".into(),
            AttrValue::Float(temperature_stability),
        );
        details.insert("adjustment".into(), AttrValue::from("precise"));
        (score, details)
    }

    fn score_sample(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Sample.base();

        let indicators = [
            record.flag("fusion_compatible"),
            record.flag("pipeline_compatible"),
            record.contains("resonance_frequency"),
            record.contains("harmonic_signature"),
        ];
        let present = indicators.iter().filter(|&&set| set).count();
        let sample_quality = present as f64 / indicators.len() as f64;
        score += sample_quality * 0.03;

        let mut details = Attrs::new();
        details.insert("sample_quality".into(), AttrValue::Float(sample_quality));
        (score, details)
    }

    fn score_finalize(&self, record: &CompositeRecord) -> (f64, Attrs) {
        let mut score = Stage::Finalize.base();

        if record.contains("coordinates") && record.contains("resonance_frequency") {
            score += 0.02;
        }
        // A record that never opted out of delivery counts as ready
        let ready = record.get("ready").map(AttrValue::is_truthy).unwrap_or(true);
        if ready {
            score += 0.01;
        }
        let (minimum, maximum) = self.nominal_range;
        let final_quality = score >= minimum && score <= maximum;
        if final_quality {
            score += 0.01;
        }

        let mut details = Attrs::new();
        details.insert("ready".into(), AttrValue::Bool(ready));
        details.insert("final_quality".into(), AttrValue::Bool(final_quality));
        (score, details)
    }
}

fn nested_flag(record: &CompositeRecord, outer: &str, inner: &str) -> bool {
    match record.get(outer) {
        Some(AttrValue::Map(map)) => map.get(inner).map(AttrValue::is_truthy).unwrap_or(false),
        _ => false,
    }
}
