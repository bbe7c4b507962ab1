//! The processing chain session: narrow, boost, stabilize
//!
//! All three transforms read and write the session's numeric state; the
//! state is private to one session and calls against it are sequential
//! (`&mut self`). The transforms never fail and never mutate their input
//! record; each returns a new annotated copy.

use super::config::ChainConfig;
use crate::fusion::constants::{
    frequency_locked, golden_ratio, DEFAULT_BASE_FREQUENCY, QUALITY_MARGIN, REFERENCE_FREQUENCY,
};
use crate::ids::short_hex;
use crate::record::{AttrValue, Attrs};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Snapshot of a chain session's state and counters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainStatus {
    pub base_frequency: f64,
    pub narrow_threshold: f64,
    pub lift_threshold: f64,
    pub attractor_epsilon: f64,
    pub lift_level: f64,
    pub attractor_active: bool,
    pub coherence: f64,
    pub collapse_count: u64,
    pub operations: u64,
}

/// Applies the three ordered post-processing transforms to graded
/// record payloads
///
/// State is initialized explicitly at construction: the lift level
/// starts at its threshold and the attractor starts active, so no
/// transform carries hidden first-use side effects.
#[derive(Debug, Clone)]
pub struct ProcessingChain {
    config: ChainConfig,
    lift_level: f64,
    attractor_active: bool,
    coherence: f64,
    collapse_count: u64,
    operations: u64,
}

impl Default for ProcessingChain {
    fn default() -> Self {
        Self::new(ChainConfig::default())
    }
}

impl ProcessingChain {
    pub fn new(config: ChainConfig) -> Self {
        Self {
            lift_level: config.lift_threshold,
            attractor_active: true,
            coherence: 1.0,
            collapse_count: 0,
            operations: 0,
            config,
        }
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Current lift level; never decreases within a session
    pub fn lift_level(&self) -> f64 {
        self.lift_level
    }

    /// Session coherence; decays slightly with each narrow step
    pub fn coherence(&self) -> f64 {
        self.coherence
    }

    pub fn collapse_count(&self) -> u64 {
        self.collapse_count
    }

    /// Narrow step: collapse remaining indeterminacy into a certainty
    ///
    /// Appends the monotonic collapse counter and applies the fixed
    /// coherence decay.
    pub fn narrow(&mut self, record: &Attrs) -> Attrs {
        let certainty = 1.0 - self.config.narrow_threshold;
        self.collapse_count += 1;
        self.coherence *= 0.99;
        self.operations += 1;

        debug!(
            certainty = %format!("{certainty:.2}"),
            collapse = self.collapse_count,
            "narrow applied"
        );

        let mut out = record.clone();
        out.insert("narrowed".into(), AttrValue::Bool(true));
        out.insert("certainty".into(), AttrValue::Float(certainty));
        out.insert(
            "collapse_index".into(),
            AttrValue::Int(self.collapse_count as i64),
        );
        out.insert(
            "branch_weight".into(),
            AttrValue::Float(self.config.base_frequency / REFERENCE_FREQUENCY),
        );
        out.insert(
            "narrow_metadata".into(),
            map(&[
                (
                    "collapse_count",
                    AttrValue::Int(self.collapse_count as i64),
                ),
                ("coherence", AttrValue::Float(self.coherence)),
                (
                    "narrow_threshold",
                    AttrValue::Float(self.config.narrow_threshold),
                ),
            ]),
        );
        out
    }

    /// Boost step: ratchet the lift level up to its threshold and derive
    /// the shaping potential
    ///
    /// The lift level only ever moves upward; repeated boosts within a
    /// session never lower it.
    pub fn boost(&mut self, record: &Attrs) -> Attrs {
        if self.lift_level < self.config.lift_threshold {
            debug!(
                from = %format!("{:.2}", self.lift_level),
                to = %format!("{:.2}", self.config.lift_threshold),
                "raising lift level"
            );
            self.lift_level = self.config.lift_threshold;
        }
        self.operations += 1;

        let phi = golden_ratio();
        let coherence_bonus = self.coherence * 0.1;
        let phi_adjustment = (phi - 1.0) * 0.1;
        let shaping_potential = ((self.lift_level + coherence_bonus + phi_adjustment)
            * (1.0 - QUALITY_MARGIN))
            .min(0.99);

        debug!(
            potential = %format!("{shaping_potential:.3}"),
            "boost applied"
        );

        let mut out = record.clone();
        out.insert("boosted".into(), AttrValue::Bool(true));
        out.insert("lift_level".into(), AttrValue::Float(self.lift_level));
        out.insert(
            "shaping_potential".into(),
            AttrValue::Float(shaping_potential),
        );
        out.insert(
            "damping_coefficient".into(),
            AttrValue::Float(self.lift_level / 100.0),
        );
        out.insert(
            "lift_metadata".into(),
            map(&[
                ("phi_alignment", AttrValue::Float(phi)),
                (
                    "resonance_frequency",
                    AttrValue::Float(self.config.base_frequency),
                ),
            ]),
        );
        out
    }

    /// Stabilize step: anchor the record with the attractor
    ///
    /// An inactive attractor is re-armed rather than reported as an
    /// error.
    pub fn stabilize(&mut self, record: &Attrs) -> Attrs {
        if !self.attractor_active {
            debug!("attractor inactive, re-arming");
            self.attractor_active = true;
        }
        self.operations += 1;

        let stability_factor = self.stability_factor();
        let harmonic_stability = self.harmonic_stability();
        let anchor_strength = self.anchor_strength();

        debug!(
            stability = %format!("{stability_factor:.3}"),
            "stabilize applied"
        );

        let mut out = record.clone();
        out.insert("stabilized".into(), AttrValue::Bool(true));
        out.insert(
            "stability_factor".into(),
            AttrValue::Float(stability_factor),
        );
        out.insert(
            "harmonic_stability".into(),
            AttrValue::Float(harmonic_stability),
        );
        out.insert(
            "anchor".into(),
            map(&[
                ("anchored", AttrValue::Bool(true)),
                ("strength", AttrValue::Float(anchor_strength)),
                (
                    "frequency",
                    AttrValue::Float(self.config.base_frequency),
                ),
                (
                    "signature",
                    AttrValue::from(format!("anchor_{}", short_hex(6))),
                ),
            ]),
        );
        out.insert(
            "attractor_metadata".into(),
            map(&[
                (
                    "epsilon",
                    AttrValue::Float(self.config.attractor_epsilon),
                ),
                ("margin_preserved", AttrValue::Bool(true)),
            ]),
        );
        out
    }

    /// Run all three transforms in their fixed order
    pub fn process(&mut self, record: &Attrs) -> Attrs {
        let narrowed = self.narrow(record);
        let boosted = self.boost(&narrowed);
        self.stabilize(&boosted)
    }

    fn stability_factor(&self) -> f64 {
        let base = 1.0 - self.config.attractor_epsilon;
        let coherence_contribution = self.coherence * 0.05;
        let lift_contribution = if self.lift_level > 0.8 {
            (self.lift_level - 0.8) * 0.1
        } else {
            0.0
        };
        (base + coherence_contribution + lift_contribution).min(0.99 - QUALITY_MARGIN)
    }

    fn harmonic_stability(&self) -> f64 {
        let frequency_stability =
            if frequency_locked(self.config.base_frequency, DEFAULT_BASE_FREQUENCY) {
                0.95
            } else {
                0.8
            };
        let phi_harmonic = golden_ratio().sin() * 0.1 + 0.85;
        (frequency_stability + phi_harmonic) / 2.0
    }

    fn anchor_strength(&self) -> f64 {
        let base_strength = self.coherence * 0.8;
        let lift_contribution = self.lift_level * 0.15;
        let frequency_contribution =
            if frequency_locked(self.config.base_frequency, DEFAULT_BASE_FREQUENCY) {
                0.1
            } else {
                0.05
            };
        (base_strength + lift_contribution + frequency_contribution).min(0.95)
    }

    /// Snapshot of the session state and counters
    pub fn status(&self) -> ChainStatus {
        ChainStatus {
            base_frequency: self.config.base_frequency,
            narrow_threshold: self.config.narrow_threshold,
            lift_threshold: self.config.lift_threshold,
            attractor_epsilon: self.config.attractor_epsilon,
            lift_level: self.lift_level,
            attractor_active: self.attractor_active,
            coherence: self.coherence,
            collapse_count: self.collapse_count,
            operations: self.operations,
        }
    }
}

fn map(pairs: &[(&str, AttrValue)]) -> AttrValue {
    AttrValue::Map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_initialized_at_construction() {
        let chain = ProcessingChain::default();
        assert_eq!(chain.lift_level(), 0.85);
        assert!(chain.status().attractor_active);
        assert_eq!(chain.coherence(), 1.0);
        assert_eq!(chain.collapse_count(), 0);
    }

    #[test]
    fn test_narrow_certainty_and_decay() {
        let mut chain = ProcessingChain::default();
        let out = chain.narrow(&Attrs::new());

        assert_eq!(out["certainty"], AttrValue::Float(0.7));
        assert_eq!(out["collapse_index"], AttrValue::Int(1));
        assert!((chain.coherence() - 0.99).abs() < 1e-12);

        chain.narrow(&Attrs::new());
        assert_eq!(chain.collapse_count(), 2);
        assert!((chain.coherence() - 0.99 * 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_lift_never_decreases_across_boosts() {
        let mut chain = ProcessingChain::default();
        let mut previous = chain.lift_level();
        for _ in 0..3 {
            let out = chain.boost(&Attrs::new());
            let level = out["lift_level"].as_f64().unwrap();
            assert!(level >= previous);
            assert!(level >= chain.config().lift_threshold);
            previous = level;
        }
    }

    #[test]
    fn test_shaping_potential_is_capped() {
        let mut chain = ProcessingChain::default();
        let out = chain.boost(&Attrs::new());
        let potential = out["shaping_potential"].as_f64().unwrap();
        assert!(potential > 0.0 && potential <= 0.99);
    }

    #[test]
    fn test_stability_factor_preserves_margin() {
        let mut chain = ProcessingChain::default();
        let out = chain.stabilize(&Attrs::new());
        let stability = out["stability_factor"].as_f64().unwrap();
        assert!(stability <= 0.99 - QUALITY_MARGIN + 1e-12);
        assert!(stability > 0.0);
    }

    #[test]
    fn test_anchor_strength_bounds() {
        let mut chain = ProcessingChain::default();
        let out = chain.stabilize(&Attrs::new());
        let AttrValue::Map(anchor) = &out["anchor"] else {
            panic!("expected anchor map");
        };
        let strength = anchor["strength"].as_f64().unwrap();
        assert!(strength > 0.0 && strength <= 0.95);
    }

    #[test]
    fn test_process_runs_all_three_in_order() {
        let mut chain = ProcessingChain::default();
        let mut record = Attrs::new();
        record.insert("overall_score".into(), AttrValue::Float(0.9));

        let out = chain.process(&record);

        // Annotations from every step survive on the final record
        for key in [
            "certainty",
            "shaping_potential",
            "stability_factor",
            "anchor",
        ] {
            assert!(out.contains_key(key), "missing {key}");
        }
        // The original record is untouched
        assert_eq!(record.len(), 1);
        assert_eq!(chain.status().operations, 3);
    }

    #[test]
    fn test_outputs_stay_in_unit_interval() {
        let mut chain = ProcessingChain::default();
        let out = chain.process(&Attrs::new());
        for key in [
            "certainty",
            "shaping_potential",
            "stability_factor",
            "harmonic_stability",
        ] {
            let value = out[key].as_f64().unwrap();
            assert!((0.0..=1.0).contains(&value), "{key} out of range: {value}");
        }
    }

    #[test]
    fn test_sessions_do_not_share_state() {
        let mut a = ProcessingChain::default();
        let b = ProcessingChain::default();
        a.narrow(&Attrs::new());
        assert_eq!(a.collapse_count(), 1);
        assert_eq!(b.collapse_count(), 0);
    }
}
