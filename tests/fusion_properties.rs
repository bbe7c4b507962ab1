//! Fusion invariants
//!
//! Covers the merge-rule guarantees: key-set union, synthesis counting,
//! single-input idempotence, numeric averaging, and the empty-input
//! policy.

use assay::{AttrValue, Attrs, FuseError, InputRecord, InputTag, RecordFuser};

fn content_map(pairs: &[(&str, AttrValue)]) -> AttrValue {
    AttrValue::Map(
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
    )
}

fn content_keys(attrs: &Attrs) -> Vec<String> {
    match attrs.get("content") {
        Some(AttrValue::Map(map)) => map.keys().cloned().collect(),
        _ => Vec::new(),
    }
}

#[test]
fn test_content_key_set_is_union_of_inputs() {
    let mut fuser = RecordFuser::default();
    let composite = fuser
        .fuse(&[
            InputRecord::new(
                content_map(&[
                    ("alpha", AttrValue::Int(1)),
                    ("shared", AttrValue::Float(0.2)),
                ]),
                InputTag::Semantic,
            ),
            InputRecord::new(
                content_map(&[
                    ("beta", AttrValue::Int(2)),
                    ("shared", AttrValue::Float(0.4)),
                ]),
                InputTag::Contextual,
            ),
            InputRecord::new(
                content_map(&[("gamma", AttrValue::Int(3))]),
                InputTag::Historical,
            ),
        ])
        .unwrap();

    let mut keys = content_keys(&composite.attrs);
    keys.sort();
    assert_eq!(keys, ["alpha", "beta", "gamma", "shared"]);

    // Shared numeric key collapsed to a single averaged value
    let AttrValue::Map(content) = composite.get("content").unwrap() else {
        panic!("expected content map");
    };
    assert_eq!(content["shared"], AttrValue::Float(0.3));
}

#[test]
fn test_synthesis_count_equals_input_count() {
    let mut fuser = RecordFuser::default();
    for n in 2..=5 {
        let inputs: Vec<_> = (0..n)
            .map(|i| InputRecord::new(format!("fragment {i}"), InputTag::Semantic))
            .collect();
        let composite = fuser.fuse(&inputs).unwrap();
        assert_eq!(composite.synthesis_count(), Some(n as i64));
    }
}

#[test]
fn test_single_input_fusion_is_idempotent_for_numerics() {
    let mut fuser = RecordFuser::default();
    let composite = fuser
        .fuse(&[InputRecord::new(
            content_map(&[("score", AttrValue::Float(0.8))]),
            InputTag::Semantic,
        )])
        .unwrap();

    // No averaging with one operand, and no synthesis counter
    let AttrValue::Map(content) = composite.get("content").unwrap() else {
        panic!("expected content map");
    };
    assert_eq!(content["score"], AttrValue::Float(0.8));
    assert_eq!(composite.synthesis_count(), None);
}

#[test]
fn test_two_scores_average_pairwise() {
    let mut fuser = RecordFuser::default();
    let composite = fuser
        .fuse(&[
            InputRecord::new(
                content_map(&[("score", AttrValue::Float(0.8))]),
                InputTag::Semantic,
            ),
            InputRecord::new(
                content_map(&[("score", AttrValue::Float(0.6))]),
                InputTag::Semantic,
            ),
        ])
        .unwrap();

    let AttrValue::Map(content) = composite.get("content").unwrap() else {
        panic!("expected content map");
    };
    assert_eq!(content["score"], AttrValue::Float(0.7));
}

#[test]
fn test_empty_input_raises_and_single_never_does() {
    let mut fuser = RecordFuser::default();
    assert!(matches!(fuser.fuse(&[]), Err(FuseError::EmptyInput)));

    for tag in InputTag::ALL {
        assert!(fuser.fuse(&[InputRecord::new("x", tag)]).is_ok());
    }
}

#[test]
fn test_composite_carries_resonance_and_coherence() {
    let mut fuser = RecordFuser::default();
    let composite = fuser
        .fuse(&[
            InputRecord::new("a", InputTag::Semantic),
            InputRecord::new("b", InputTag::Vector),
        ])
        .unwrap();

    for key in [
        "resonance_frequency",
        "harmonic_ratio",
        "harmonic_series",
        "harmonic_stability",
        "coherence_score",
        "frequency_signature",
        "pitch_ratio",
    ] {
        assert!(composite.contains(key), "missing {key}");
    }

    let coherence = composite.coherence();
    assert!(coherence > 0.0 && coherence <= 0.99);

    let stability = composite.number("harmonic_stability").unwrap();
    assert!((0.8..=0.95).contains(&stability));

    assert!(fuser.validate(&composite));
}
