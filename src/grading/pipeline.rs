//! The grading pipeline: ordered stages, weighted aggregation,
//! classification against a named standard

use super::evaluator::StageEvaluator;
use super::stage::{Stage, StageResult};
use super::standard::{letter_grade, QualityStandard};
use crate::fusion::constants::DEFAULT_BASE_FREQUENCY;
use crate::ids::short_id;
use crate::record::{AttrValue, Attrs, CompositeRecord};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Standard applied when a grading call names none
    pub standard: QualityStandard,
    /// Configurable floor of the default standard's nominal range
    pub minimum: f64,
    /// Ceiling of the nominal range, used by the finalize self-check
    pub maximum: f64,
    /// Base frequency for stage-level frequency locks
    pub base_frequency: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            standard: QualityStandard::default(),
            minimum: 0.88,
            maximum: 0.92,
            base_frequency: DEFAULT_BASE_FREQUENCY,
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_standard(mut self, standard: QualityStandard) -> Self {
        self.standard = standard;
        self
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn with_base_frequency(mut self, base_frequency: f64) -> Self {
        self.base_frequency = base_frequency;
        self
    }
}

/// Qualitative assessments derived from the stage results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityMetrics {
    pub integration: String,
    pub stability: String,
    pub semantic_coherence: String,
    pub compatibility: String,
    pub overall: String,
}

/// The pipeline's scored, classified output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradedRecord {
    pub validation_id: String,
    pub standard_name: String,
    pub overall_score: f64,
    pub passes: bool,
    pub grade_letter: String,
    /// One result per stage, in evaluation order
    pub stage_results: Vec<StageResult>,
    pub quality_metrics: QualityMetrics,
    pub grading_seconds: f64,
    pub signature: String,
}

impl GradedRecord {
    /// Look up a stage result by stage name
    pub fn stage_result(&self, name: &str) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| r.stage == name)
    }

    /// The graded record as a plain attribute payload for post-processing
    pub fn to_attrs(&self) -> Attrs {
        match serde_json::to_value(self) {
            Ok(value) => match AttrValue::from_json(value) {
                AttrValue::Map(attrs) => attrs,
                _ => Attrs::new(),
            },
            Err(_) => Attrs::new(),
        }
    }
}

/// Aggregate pipeline statistics for reporting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineStatus {
    pub standard: String,
    pub minimum: f64,
    pub maximum: f64,
    pub stages: Vec<String>,
    pub validation_count: u64,
    pub passed_validations: u64,
    pub average_score: f64,
    pub pass_rate: f64,
}

/// Weighted mean of stage scores using the fixed per-stage weights
///
/// Results for unknown stage names carry weight 1.0, so a zero-score
/// unknown stage drags the aggregate down instead of being ignored.
pub fn weighted_mean(results: &[StageResult]) -> f64 {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    for result in results {
        let weight = Stage::from_name(&result.stage)
            .map(|s| s.weight())
            .unwrap_or(1.0);
        weighted_sum += result.score * weight;
        total_weight += weight;
    }
    if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    }
}

/// Grades composite records through all seven stages
///
/// Holds instance-local counters for reporting; independent pipelines
/// never share them.
#[derive(Debug, Clone)]
pub struct GradingPipeline {
    config: PipelineConfig,
    evaluator: StageEvaluator,
    validation_count: u64,
    total_score: f64,
    passed_validations: u64,
}

impl Default for GradingPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl GradingPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let evaluator =
            StageEvaluator::new(config.base_frequency, (config.minimum, config.maximum));
        Self {
            config,
            evaluator,
            validation_count: 0,
            total_score: 0.0,
            passed_validations: 0,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &StageEvaluator {
        &self.evaluator
    }

    /// Grade a composite record against a named standard
    ///
    /// All seven stages run in order regardless of earlier results; no
    /// stage failure short-circuits the pipeline and nothing here raises
    /// for malformed input.
    pub fn grade(
        &mut self,
        record: &CompositeRecord,
        standard_name: Option<&str>,
    ) -> GradedRecord {
        let start = Instant::now();
        let standard = standard_name
            .map(QualityStandard::from_name)
            .unwrap_or(self.config.standard);
        let validation_id = short_id("grade");

        debug!(%validation_id, standard = %standard, fusion_id = %record.fusion_id, "starting grading");

        let stage_results: Vec<StageResult> = Stage::ALL
            .iter()
            .map(|stage| self.evaluator.evaluate_stage(*stage, record))
            .collect();

        let overall_score = weighted_mean(&stage_results);
        let passes = standard.passes(overall_score, self.config.minimum);
        let grade = letter_grade(overall_score, self.config.minimum);
        let quality_metrics = self.quality_metrics(&stage_results, overall_score);

        self.validation_count += 1;
        self.total_score += overall_score;
        if passes {
            self.passed_validations += 1;
        }

        info!(
            %validation_id,
            score = %format!("{overall_score:.3}"),
            passes,
            grade,
            "grading complete"
        );

        GradedRecord {
            signature: format!("{validation_id}@{overall_score:.3}"),
            validation_id,
            standard_name: standard.name().to_string(),
            overall_score,
            passes,
            grade_letter: grade.to_string(),
            stage_results,
            quality_metrics,
            grading_seconds: start.elapsed().as_secs_f64(),
        }
    }

    /// Grade a record and return its attributes annotated with the
    /// validation summary, plus a quality seal when it passes
    pub fn certify(&mut self, record: &CompositeRecord) -> Attrs {
        let graded = self.grade(record, None);
        let mut attrs = record.attrs.clone();

        let mut validation = Attrs::new();
        validation.insert(
            "validation_id".into(),
            AttrValue::from(graded.validation_id.clone()),
        );
        validation.insert("score".into(), AttrValue::Float(graded.overall_score));
        validation.insert("passes".into(), AttrValue::Bool(graded.passes));
        validation.insert("standard".into(), AttrValue::from(graded.standard_name.clone()));
        validation.insert(
            "grade_letter".into(),
            AttrValue::from(graded.grade_letter.clone()),
        );
        validation.insert("signature".into(), AttrValue::from(graded.signature.clone()));
        attrs.insert("validation".into(), AttrValue::Map(validation));

        if graded.passes {
            let mut seal = Attrs::new();
            seal.insert("standard".into(), AttrValue::from(graded.standard_name.clone()));
            seal.insert("score".into(), AttrValue::Float(graded.overall_score));
            seal.insert("certified_by".into(), AttrValue::from("assay-grading"));
            seal.insert(
                "certified_at".into(),
                AttrValue::from(chrono::Utc::now().to_rfc3339()),
            );
            attrs.insert("quality_seal".into(), AttrValue::Map(seal));
        }

        attrs
    }

    fn quality_metrics(&self, results: &[StageResult], overall: f64) -> QualityMetrics {
        let score_of = |name: &str| {
            results
                .iter()
                .find(|r| r.stage == name)
                .map(|r| r.score)
                .unwrap_or(0.0)
        };

        let integrate = score_of("integrate");
        let integration = if integrate >= 0.92 {
            "excellent"
        } else if integrate >= 0.88 {
            "good"
        } else {
            "needs_improvement"
        };

        let temper = score_of("temper");
        let stability = if temper >= 0.91 {
            "stable"
        } else if temper >= 0.87 {
            "mostly_stable"
        } else {
            "unstable"
        };

        let compress = score_of("compress");
        let semantic_coherence = if compress >= 0.90 {
            "coherent"
        } else if compress >= 0.85 {
            "adequate"
        } else {
            "fragmented"
        };

        let compatible = results
            .iter()
            .find(|r| r.stage == "prepare")
            .and_then(|r| r.details.get("pipeline_marker"))
            .map(AttrValue::is_truthy)
            .unwrap_or(false);
        let compatibility = if compatible {
            "fully_compatible"
        } else {
            "requires_adaptation"
        };

        let overall_quality = if overall >= 0.93 {
            "exceptional"
        } else if overall >= self.config.minimum {
            "meets_standard"
        } else if overall >= 0.80 {
            "acceptable"
        } else {
            "below_standard"
        };

        QualityMetrics {
            integration: integration.to_string(),
            stability: stability.to_string(),
            semantic_coherence: semantic_coherence.to_string(),
            compatibility: compatibility.to_string(),
            overall: overall_quality.to_string(),
        }
    }

    /// Aggregate statistics for this pipeline instance
    pub fn status(&self) -> PipelineStatus {
        let (average, rate) = if self.validation_count > 0 {
            (
                self.total_score / self.validation_count as f64,
                self.passed_validations as f64 / self.validation_count as f64,
            )
        } else {
            (0.0, 0.0)
        };
        PipelineStatus {
            standard: self.config.standard.name().to_string(),
            minimum: self.config.minimum,
            maximum: self.config.maximum,
            stages: Stage::ALL.iter().map(|s| s.name().to_string()).collect(),
            validation_count: self.validation_count,
            passed_validations: self.passed_validations,
            average_score: average,
            pass_rate: rate,
        }
    }
}
