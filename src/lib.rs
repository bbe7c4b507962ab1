//! Assay: Record Fusion and Quality Grading Engine
//!
//! Fuses heterogeneous tagged input records into a single composite
//! record, grades the composite through a seven-stage weighted quality
//! pipeline, and post-processes the graded result with three
//! deterministic transforms.
//!
//! # Core Concepts
//!
//! - **Input records**: tagged content fragments (semantic, contextual,
//!   historical, vector)
//! - **Composite records**: the type-aware merge of all inputs, stamped
//!   with resonance attributes and a coherence score
//! - **Grading**: seven ordered stages, weighted aggregation, pass/fail
//!   against a named quality standard, letter grade
//! - **Processing chain**: narrow → boost → stabilize, annotating the
//!   graded payload with certainty and stability attributes
//!
//! # Example
//!
//! ```
//! use assay::{GradingPipeline, InputRecord, InputTag, RecordFuser};
//!
//! let mut fuser = RecordFuser::default();
//! let composite = fuser
//!     .fuse(&[
//!         InputRecord::new("observed fragment", InputTag::Semantic),
//!         InputRecord::new("embedding fragment", InputTag::Vector),
//!     ])
//!     .expect("non-empty input");
//!
//! let mut pipeline = GradingPipeline::default();
//! let graded = pipeline.grade(&composite, None);
//! assert_eq!(graded.stage_results.len(), 7);
//! ```

pub mod chain;
mod engine;
pub mod fusion;
pub mod grading;
mod ids;
pub mod record;

pub use chain::{ChainConfig, ChainStatus, ProcessingChain};
pub use engine::{
    AssayEngine, EngineError, EngineResult, PipelineSession, SessionConfig, SessionId,
    SessionStatus,
};
pub use fusion::{FuseError, FuserConfig, FuserStatus, MismatchPolicy, RecordFuser};
pub use grading::{
    letter_grade, weighted_mean, GradedRecord, GradingPipeline, PipelineConfig, PipelineStatus,
    QualityMetrics, QualityStandard, Stage, StageEvaluator, StageResult, StageStatus,
};
pub use record::{AttrValue, Attrs, CompositeRecord, InputRecord, InputTag, ValueKind};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
