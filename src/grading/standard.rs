//! Named quality standards and letter grades

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A named closed score interval used for pass/fail classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityStandard {
    /// Passes within [minimum, 0.95]; minimum is configurable
    #[default]
    AMinus,
    /// Passes within [0.82, 0.87]
    BPlus,
    /// Passes within [0.93, 0.97]
    APlus,
}

impl QualityStandard {
    pub fn name(&self) -> &'static str {
        match self {
            QualityStandard::AMinus => "A-minus",
            QualityStandard::BPlus => "B-plus",
            QualityStandard::APlus => "A-plus",
        }
    }

    /// Resolve a standard by name; unrecognized names fall back to the
    /// default standard rather than failing
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "a-minus" => QualityStandard::AMinus,
            "b-plus" => QualityStandard::BPlus,
            "a-plus" => QualityStandard::APlus,
            other => {
                debug!(standard = other, "unrecognized standard, using default");
                QualityStandard::default()
            }
        }
    }

    /// The closed passing interval for this standard
    ///
    /// The A-minus standard accepts scores above its nominal maximum up
    /// to 0.95; callers should aim for the nominal range but excellence
    /// is not a failure.
    pub fn passing_range(&self, minimum: f64) -> (f64, f64) {
        match self {
            QualityStandard::AMinus => (minimum, 0.95),
            QualityStandard::BPlus => (0.82, 0.87),
            QualityStandard::APlus => (0.93, 0.97),
        }
    }

    /// Whether a score passes under this standard
    pub fn passes(&self, score: f64, minimum: f64) -> bool {
        let (low, high) = self.passing_range(minimum);
        score >= low && score <= high
    }
}

impl std::fmt::Display for QualityStandard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Letter grade for an overall score, descending thresholds
pub fn letter_grade(score: f64, minimum: f64) -> &'static str {
    if score >= 0.95 {
        "A+"
    } else if score >= 0.93 {
        "A"
    } else if score >= minimum {
        "A-"
    } else if score >= 0.85 {
        "B+"
    } else if score >= 0.80 {
        "B"
    } else if score >= 0.75 {
        "B-"
    } else {
        "C"
    }
}
