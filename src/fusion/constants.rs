//! Fixed numeric parameters shared across the fusion and grading stages

/// Default base resonance frequency for new fusers and chains
pub const DEFAULT_BASE_FREQUENCY: f64 = 415.3;

/// Reference frequency used for pitch ratios (concert A)
pub const REFERENCE_FREQUENCY: f64 = 440.0;

/// Margin reserved below 1.0; no quality score may consume it
pub const QUALITY_MARGIN: f64 = 0.03;

/// Minimum coherence for a composite to count as compatible
pub const COHERENCE_THRESHOLD: f64 = 0.75;

/// Allowed drift when checking a frequency lock
pub const FREQUENCY_LOCK_TOLERANCE: f64 = 0.1;

/// Number of entries in a stamped harmonic series
pub const HARMONIC_COUNT: u32 = 7;

/// The golden ratio
pub fn golden_ratio() -> f64 {
    (1.0 + 5.0_f64.sqrt()) / 2.0
}

/// Whether a frequency is locked to the given base
pub fn frequency_locked(frequency: f64, base: f64) -> bool {
    (frequency - base).abs() < FREQUENCY_LOCK_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_ratio_value() {
        assert!((golden_ratio() - 1.618_033_988_749_895).abs() < 1e-12);
    }

    #[test]
    fn test_frequency_lock_tolerance() {
        assert!(frequency_locked(415.35, DEFAULT_BASE_FREQUENCY));
        assert!(!frequency_locked(415.5, DEFAULT_BASE_FREQUENCY));
        assert!(!frequency_locked(REFERENCE_FREQUENCY, DEFAULT_BASE_FREQUENCY));
    }
}
