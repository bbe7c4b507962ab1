//! Weighted quality grading pipeline
//!
//! A composite record runs through seven fixed stages, each scored
//! independently from a documented base with additive, capped bonuses.
//! Stage scores aggregate into a weighted mean that is classified
//! against a named quality standard and mapped to a letter grade.

mod evaluator;
mod pipeline;
mod stage;
mod standard;

pub use evaluator::StageEvaluator;
pub use pipeline::{
    weighted_mean, GradedRecord, GradingPipeline, PipelineConfig, PipelineStatus, QualityMetrics,
};
pub use stage::{Stage, StageResult, StageStatus};
pub use standard::{letter_grade, QualityStandard};
