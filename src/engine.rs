//! AssayEngine: the main entry point for pipeline sessions
//!
//! Each session owns one fuser, one grading pipeline, and one processing
//! chain. Sessions are independent: their counters and chain state are
//! never shared, so separate sessions may be driven concurrently while
//! calls within a session stay sequential behind the map's exclusive
//! guard.

use crate::chain::{ChainConfig, ChainStatus, ProcessingChain};
use crate::fusion::{FuseError, FuserConfig, FuserStatus, RecordFuser};
use crate::grading::{GradedRecord, GradingPipeline, PipelineConfig, PipelineStatus};
use crate::record::{Attrs, CompositeRecord, InputRecord};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("Fusion failed: {0}")]
    Fuse(#[from] FuseError),
}

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Unique identifier for a pipeline session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Create a new random SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create a SessionId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Configuration for a whole session
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub fuser: FuserConfig,
    pub pipeline: PipelineConfig,
    pub chain: ChainConfig,
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one base frequency to all three components
    pub fn with_base_frequency(mut self, base_frequency: f64) -> Self {
        self.fuser.base_frequency = base_frequency;
        self.pipeline.base_frequency = base_frequency;
        self.chain.base_frequency = base_frequency;
        self
    }

    pub fn with_minimum(mut self, minimum: f64) -> Self {
        self.pipeline.minimum = minimum;
        self
    }
}

/// Combined status report for one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub fuser: FuserStatus,
    pub pipeline: PipelineStatus,
    pub chain: ChainStatus,
}

/// One fuser + pipeline + chain with private mutable state
#[derive(Debug, Clone)]
pub struct PipelineSession {
    pub fuser: RecordFuser,
    pub pipeline: GradingPipeline,
    pub chain: ProcessingChain,
}

impl PipelineSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            fuser: RecordFuser::new(config.fuser),
            pipeline: GradingPipeline::new(config.pipeline),
            chain: ProcessingChain::new(config.chain),
        }
    }

    /// Fuse, grade, and post-process in one pass
    pub fn run(
        &mut self,
        inputs: &[InputRecord],
        standard: Option<&str>,
    ) -> Result<Attrs, FuseError> {
        let composite = self.fuser.fuse(inputs)?;
        let graded = self.pipeline.grade(&composite, standard);
        Ok(self.chain.process(&graded.to_attrs()))
    }
}

/// The main engine, managing concurrent pipeline sessions
#[derive(Debug, Default)]
pub struct AssayEngine {
    sessions: DashMap<SessionId, PipelineSession>,
}

impl AssayEngine {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Create a session with the given configuration
    pub fn create_session(&self, config: SessionConfig) -> SessionId {
        let id = SessionId::new();
        self.sessions.insert(id.clone(), PipelineSession::new(config));
        id
    }

    /// Run the full fuse → grade → process pipeline in a session
    pub fn run(
        &self,
        id: &SessionId,
        inputs: &[InputRecord],
        standard: Option<&str>,
    ) -> EngineResult<Attrs> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(session.run(inputs, standard)?)
    }

    /// Fuse inputs in a session
    pub fn fuse(&self, id: &SessionId, inputs: &[InputRecord]) -> EngineResult<CompositeRecord> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(session.fuser.fuse(inputs)?)
    }

    /// Grade a composite record in a session
    pub fn grade(
        &self,
        id: &SessionId,
        record: &CompositeRecord,
        standard: Option<&str>,
    ) -> EngineResult<GradedRecord> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(session.pipeline.grade(record, standard))
    }

    /// Grade and annotate a record with a validation summary and seal
    pub fn certify(&self, id: &SessionId, record: &CompositeRecord) -> EngineResult<Attrs> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(session.pipeline.certify(record))
    }

    /// Apply the post-processing chain to a record payload in a session
    pub fn process(&self, id: &SessionId, record: &Attrs) -> EngineResult<Attrs> {
        let mut session = self
            .sessions
            .get_mut(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(session.chain.process(record))
    }

    /// Status report for one session
    pub fn session_status(&self, id: &SessionId) -> EngineResult<SessionStatus> {
        let session = self
            .sessions
            .get(id)
            .ok_or_else(|| EngineError::SessionNotFound(id.clone()))?;
        Ok(SessionStatus {
            session_id: id.clone(),
            fuser: session.fuser.status(),
            pipeline: session.pipeline.status(),
            chain: session.chain.status(),
        })
    }

    /// Remove a session, returning whether it existed
    pub fn remove_session(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    /// List all session IDs
    pub fn list_sessions(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|r| r.key().clone()).collect()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::InputTag;

    #[test]
    fn test_create_and_remove_session() {
        let engine = AssayEngine::new();
        assert_eq!(engine.session_count(), 0);

        let id = engine.create_session(SessionConfig::default());
        assert_eq!(engine.session_count(), 1);
        assert!(engine.has_session(&id));

        assert!(engine.remove_session(&id));
        assert_eq!(engine.session_count(), 0);
    }

    #[test]
    fn test_run_full_pipeline() {
        let engine = AssayEngine::new();
        let id = engine.create_session(SessionConfig::default());

        let inputs = vec![
            InputRecord::new("first fragment", InputTag::Semantic),
            InputRecord::new("second fragment", InputTag::Vector),
        ];
        let out = engine.run(&id, &inputs, Some("A-minus")).unwrap();

        for key in [
            "overall_score",
            "certainty",
            "shaping_potential",
            "stability_factor",
        ] {
            assert!(out.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_missing_session_is_an_error() {
        let engine = AssayEngine::new();
        let id = SessionId::new();
        let result = engine.run(&id, &[InputRecord::new("x", InputTag::Semantic)], None);
        assert!(matches!(result, Err(EngineError::SessionNotFound(_))));
    }

    #[test]
    fn test_empty_input_error_propagates() {
        let engine = AssayEngine::new();
        let id = engine.create_session(SessionConfig::default());
        let result = engine.run(&id, &[], None);
        assert!(matches!(result, Err(EngineError::Fuse(FuseError::EmptyInput))));
    }

    #[test]
    fn test_sessions_have_private_counters() {
        let engine = AssayEngine::new();
        let a = engine.create_session(SessionConfig::default());
        let b = engine.create_session(SessionConfig::default());

        let inputs = vec![InputRecord::new("x", InputTag::Semantic)];
        engine.run(&a, &inputs, None).unwrap();
        engine.run(&a, &inputs, None).unwrap();

        let status_a = engine.session_status(&a).unwrap();
        let status_b = engine.session_status(&b).unwrap();
        assert_eq!(status_a.pipeline.validation_count, 2);
        assert_eq!(status_b.pipeline.validation_count, 0);
        assert_eq!(status_a.chain.collapse_count, 2);
        assert_eq!(status_b.chain.collapse_count, 0);
    }
}
