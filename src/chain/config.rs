//! Processing chain thresholds

use crate::fusion::constants::DEFAULT_BASE_FREQUENCY;

/// Thresholds governing the narrow/boost/stabilize transforms
#[derive(Debug, Clone)]
pub struct ChainConfig {
    /// Indeterminacy removed by a narrow step; certainty is its complement
    pub narrow_threshold: f64,
    /// Floor the lift level ratchets up to during a boost
    pub lift_threshold: f64,
    /// Attractor epsilon feeding the stability factor
    pub attractor_epsilon: f64,
    /// Base frequency for lock checks and branch weights
    pub base_frequency: f64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            narrow_threshold: 0.3,
            lift_threshold: 0.85,
            attractor_epsilon: 0.01,
            base_frequency: DEFAULT_BASE_FREQUENCY,
        }
    }
}

impl ChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_narrow_threshold(mut self, threshold: f64) -> Self {
        self.narrow_threshold = threshold;
        self
    }

    pub fn with_lift_threshold(mut self, threshold: f64) -> Self {
        self.lift_threshold = threshold;
        self
    }

    pub fn with_base_frequency(mut self, base_frequency: f64) -> Self {
        self.base_frequency = base_frequency;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = ChainConfig::default();
        assert_eq!(config.narrow_threshold, 0.3);
        assert_eq!(config.lift_threshold, 0.85);
        assert_eq!(config.attractor_epsilon, 0.01);
    }
}
