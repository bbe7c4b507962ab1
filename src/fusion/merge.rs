//! Type-aware merge of record attributes
//!
//! Merging is defined per [`ValueKind`] pair: mappings union recursively,
//! sequences concatenate, numeric scalars average. Every other pairing is
//! a kind mismatch resolved by an explicit [`MismatchPolicy`].

use crate::record::{AttrValue, Attrs, ValueKind};
use serde::{Deserialize, Serialize};

/// How to resolve a key present in both records with un-combinable kinds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// The incoming value overwrites the accumulated one (default)
    #[default]
    LastWriterWins,
    /// The accumulated value is kept
    KeepExisting,
}

/// Merge a single incoming value into an accumulated one
pub fn merge_value(base: AttrValue, incoming: AttrValue, policy: MismatchPolicy) -> AttrValue {
    match (base, incoming) {
        (AttrValue::Map(mut a), AttrValue::Map(b)) => {
            merge_attrs(&mut a, b, policy);
            AttrValue::Map(a)
        }
        (AttrValue::Array(mut a), AttrValue::Array(b)) => {
            a.extend(b);
            AttrValue::Array(a)
        }
        (a, b) if a.kind() == ValueKind::Numeric && b.kind() == ValueKind::Numeric => {
            // as_f64 is total for Numeric values
            let left = a.as_f64().unwrap_or(0.0);
            let right = b.as_f64().unwrap_or(0.0);
            AttrValue::Float((left + right) / 2.0)
        }
        (a, b) => match policy {
            MismatchPolicy::LastWriterWins => b,
            MismatchPolicy::KeepExisting => a,
        },
    }
}

/// Merge incoming attributes into accumulated ones, key by key
///
/// Keys only present in `incoming` are copied as-is. The accumulated side
/// is always the left operand, so sequence order and numeric pairing stay
/// strictly left-to-right across a fusion run.
pub fn merge_attrs(base: &mut Attrs, incoming: Attrs, policy: MismatchPolicy) {
    for (key, value) in incoming {
        match base.remove(&key) {
            Some(existing) => {
                base.insert(key, merge_value(existing, value, policy));
            }
            None => {
                base.insert(key, value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, AttrValue)]) -> Attrs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_numeric_pair_averages() {
        let merged = merge_value(
            AttrValue::Float(0.8),
            AttrValue::Float(0.6),
            MismatchPolicy::default(),
        );
        assert_eq!(merged, AttrValue::Float(0.7));
    }

    #[test]
    fn test_int_and_float_count_as_numeric() {
        let merged = merge_value(
            AttrValue::Int(1),
            AttrValue::Float(0.0),
            MismatchPolicy::default(),
        );
        assert_eq!(merged, AttrValue::Float(0.5));
    }

    #[test]
    fn test_sequences_concatenate_left_first() {
        let merged = merge_value(
            AttrValue::Array(vec![AttrValue::Int(1), AttrValue::Int(2)]),
            AttrValue::Array(vec![AttrValue::Int(3)]),
            MismatchPolicy::default(),
        );
        assert_eq!(
            merged,
            AttrValue::Array(vec![
                AttrValue::Int(1),
                AttrValue::Int(2),
                AttrValue::Int(3)
            ])
        );
    }

    #[test]
    fn test_mappings_merge_recursively() {
        let mut base = attrs(&[(
            "nested",
            AttrValue::Map(attrs(&[
                ("shared", AttrValue::Float(0.4)),
                ("left_only", AttrValue::Bool(true)),
            ])),
        )]);
        let incoming = attrs(&[(
            "nested",
            AttrValue::Map(attrs(&[
                ("shared", AttrValue::Float(0.6)),
                ("right_only", AttrValue::Int(1)),
            ])),
        )]);

        merge_attrs(&mut base, incoming, MismatchPolicy::default());

        let AttrValue::Map(nested) = &base["nested"] else {
            panic!("expected nested map");
        };
        assert_eq!(nested["shared"], AttrValue::Float(0.5));
        assert_eq!(nested["left_only"], AttrValue::Bool(true));
        assert_eq!(nested["right_only"], AttrValue::Int(1));
    }

    #[test]
    fn test_key_only_in_incoming_is_copied() {
        let mut base = attrs(&[("a", AttrValue::Int(1))]);
        merge_attrs(
            &mut base,
            attrs(&[("b", AttrValue::Int(2))]),
            MismatchPolicy::default(),
        );
        assert_eq!(base.len(), 2);
        assert_eq!(base["b"], AttrValue::Int(2));
    }

    #[test]
    fn test_mismatch_last_writer_wins() {
        let merged = merge_value(
            AttrValue::from("first"),
            AttrValue::Int(2),
            MismatchPolicy::LastWriterWins,
        );
        assert_eq!(merged, AttrValue::Int(2));
    }

    #[test]
    fn test_mismatch_keep_existing() {
        let merged = merge_value(
            AttrValue::from("first"),
            AttrValue::Int(2),
            MismatchPolicy::KeepExisting,
        );
        assert_eq!(merged, AttrValue::from("first"));
    }

    #[test]
    fn test_strings_are_opaque_not_sequences() {
        let merged = merge_value(
            AttrValue::from("ab"),
            AttrValue::from("cd"),
            MismatchPolicy::LastWriterWins,
        );
        assert_eq!(merged, AttrValue::from("cd"));
    }
}
