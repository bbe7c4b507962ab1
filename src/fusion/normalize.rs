//! Per-input normalization
//!
//! Each input record is independently expanded into an intermediate
//! attribute set before merging: the original content, the fixed
//! mathematical constants, a deterministic resonance key, and a
//! tag-specific enrichment block.

use super::constants::{golden_ratio, QUALITY_MARGIN};
use crate::record::{AttrValue, Attrs, InputRecord, InputTag};
use std::collections::hash_map::DefaultHasher;
use std::f64::consts::{E, PI};
use std::hash::{Hash, Hasher};

/// Expand one input record into mergeable attributes
pub fn normalize(input: &InputRecord, base_frequency: f64) -> Attrs {
    let phi = golden_ratio();
    let mut attrs = Attrs::new();

    attrs.insert("content".into(), input.content.clone());
    attrs.insert("input_tag".into(), AttrValue::from(input.tag.name()));
    attrs.insert("frequency".into(), AttrValue::Float(base_frequency));
    attrs.insert("phi_factor".into(), AttrValue::Float(phi));
    attrs.insert("pi_factor".into(), AttrValue::Float(PI));
    attrs.insert("e_factor".into(), AttrValue::Float(E));
    attrs.insert("quality_margin".into(), AttrValue::Float(QUALITY_MARGIN));
    attrs.insert(
        "coordinates".into(),
        map(&[
            ("phi", AttrValue::Float(phi)),
            ("pi", AttrValue::Float(PI)),
            ("e", AttrValue::Float(E)),
            ("frequency", AttrValue::Float(base_frequency)),
        ]),
    );
    attrs.insert(
        "resonance_key".into(),
        AttrValue::from(resonance_key(&input.content, base_frequency)),
    );
    attrs.insert(
        "metadata".into(),
        map(&[
            (
                "normalized_at",
                AttrValue::from(chrono::Utc::now().to_rfc3339()),
            ),
            ("engine_version", AttrValue::from(crate::VERSION)),
        ]),
    );

    match input.tag {
        InputTag::Vector => enrich_vector(&mut attrs, phi),
        InputTag::Semantic => enrich_semantic(&mut attrs, &input.content),
        InputTag::Contextual => enrich_contextual(&mut attrs, base_frequency),
        InputTag::Historical => enrich_historical(&mut attrs),
    }

    attrs
}

/// Deterministic key from the content's string representation and the
/// configured base frequency
pub fn resonance_key(content: &AttrValue, base_frequency: f64) -> String {
    let mut hasher = DefaultHasher::new();
    content.to_compact_string().hash(&mut hasher);
    let bucket = hasher.finish() % 10_000;
    format!("res_{:.1}_{:04}", base_frequency, bucket)
}

fn enrich_vector(attrs: &mut Attrs, phi: f64) {
    attrs.insert(
        "harmonic_signature".into(),
        AttrValue::from(format!("phi{:.6}_pi{:.6}_e{:.6}", phi, PI, E)),
    );
    attrs.insert(
        "harmonic_coefficients".into(),
        map(&[
            ("phi_over_pi", AttrValue::Float(phi / PI)),
            ("pi_over_e", AttrValue::Float(PI / E)),
            ("e_over_phi", AttrValue::Float(E / phi)),
        ]),
    );
}

fn enrich_semantic(attrs: &mut Attrs, content: &AttrValue) {
    let depth = (content.to_compact_string().len() as f64 / 1000.0 + 0.7).min(0.95);
    attrs.insert(
        "symbolic_mapping".into(),
        map(&[
            ("mapping_depth", AttrValue::Int(3)),
            (
                "anchors",
                AttrValue::Array(vec![
                    AttrValue::from("record"),
                    AttrValue::from("resonance"),
                    AttrValue::from("field"),
                ]),
            ),
            ("bridge_count", AttrValue::Int(2)),
        ]),
    );
    attrs.insert(
        "semantic_binding".into(),
        map(&[
            ("semantic_depth", AttrValue::Float(depth)),
            ("mapping_coherence", AttrValue::Float(0.82)),
        ]),
    );
}

fn enrich_contextual(attrs: &mut Attrs, base_frequency: f64) {
    attrs.insert(
        "field_coordinates".into(),
        map(&[
            ("x_axis", AttrValue::from("semantic_depth")),
            ("y_axis", AttrValue::from("harmonic_resonance")),
            ("z_axis", AttrValue::from("record_quality")),
            (
                "position",
                AttrValue::Array(vec![
                    AttrValue::Float(0.7),
                    AttrValue::Float(0.85),
                    AttrValue::Float(0.9),
                ]),
            ),
        ]),
    );
    attrs.insert("field_resonance".into(), AttrValue::Float(base_frequency));
    attrs.insert(
        "field_harmonics".into(),
        map(&[
            ("primary_frequency", AttrValue::Float(base_frequency)),
            ("field_coherence", AttrValue::Float(0.87)),
        ]),
    );
}

fn enrich_historical(attrs: &mut Attrs) {
    attrs.insert(
        "momentum".into(),
        map(&[
            ("record_momentum", AttrValue::Float(0.9)),
            ("harmonic_momentum", AttrValue::Float(0.85)),
            ("field_momentum", AttrValue::Float(0.88)),
            ("induction_momentum", AttrValue::Float(0.92)),
        ]),
    );
    attrs.insert(
        "induction".into(),
        map(&[(
            "induced_at",
            AttrValue::from(chrono::Utc::now().to_rfc3339()),
        )]),
    );
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
    use crate::fusion::constants::DEFAULT_BASE_FREQUENCY;

    #[test]
    fn test_common_attributes_present() {
        let input = InputRecord::new("hello", InputTag::Semantic);
        let attrs = normalize(&input, DEFAULT_BASE_FREQUENCY);

        for key in [
            "content",
            "input_tag",
            "frequency",
            "phi_factor",
            "pi_factor",
            "e_factor",
            "coordinates",
            "resonance_key",
            "metadata",
        ] {
            assert!(attrs.contains_key(key), "missing {key}");
        }
    }

    #[test]
    fn test_tag_specific_enrichment() {
        let vector = normalize(
            &InputRecord::new("v", InputTag::Vector),
            DEFAULT_BASE_FREQUENCY,
        );
        assert!(vector.contains_key("harmonic_signature"));
        assert!(vector.contains_key("harmonic_coefficients"));

        let semantic = normalize(
            &InputRecord::new("s", InputTag::Semantic),
            DEFAULT_BASE_FREQUENCY,
        );
        assert!(semantic.contains_key("symbolic_mapping"));
        assert!(!semantic.contains_key("harmonic_signature"));

        let contextual = normalize(
            &InputRecord::new("c", InputTag::Contextual),
            DEFAULT_BASE_FREQUENCY,
        );
        assert!(contextual.contains_key("field_coordinates"));
        assert!(contextual.contains_key("field_harmonics"));

        let historical = normalize(
            &InputRecord::new("h", InputTag::Historical),
            DEFAULT_BASE_FREQUENCY,
        );
        assert!(historical.contains_key("momentum"));
    }

    #[test]
    fn test_resonance_key_is_deterministic() {
        let content = AttrValue::from("same content");
        let a = resonance_key(&content, DEFAULT_BASE_FREQUENCY);
        let b = resonance_key(&content, DEFAULT_BASE_FREQUENCY);
        assert_eq!(a, b);
        assert!(a.starts_with("res_415.3_"));

        let other = resonance_key(&AttrValue::from("different"), DEFAULT_BASE_FREQUENCY);
        // Hash buckets can collide, but the format stays fixed
        assert_eq!(other.len(), a.len());
    }

    #[test]
    fn test_semantic_depth_scales_with_content() {
        let short = normalize(
            &InputRecord::new("x", InputTag::Semantic),
            DEFAULT_BASE_FREQUENCY,
        );
        let AttrValue::Map(binding) = &short["semantic_binding"] else {
            panic!("expected map");
        };
        let depth = binding["semantic_depth"].as_f64().unwrap();
        assert!(depth >= 0.7 && depth <= 0.95);
    }
}
