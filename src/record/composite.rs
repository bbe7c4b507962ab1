//! Composite records: the merged output of a fusion call

use super::value::{AttrValue, Attrs};
use serde::{Deserialize, Serialize};

/// The single merged record produced by fusing one or more inputs
///
/// Attributes are the union of all normalized input keys plus the
/// resonance attributes stamped by the fuser. A composite is never
/// mutated after creation; downstream stages read it and produce new
/// records of their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeRecord {
    /// Unique identifier for the fusion run that produced this record
    pub fusion_id: String,
    /// Merged attributes
    pub attrs: Attrs,
}

impl CompositeRecord {
    /// Create a composite from already-merged attributes
    pub fn new(fusion_id: impl Into<String>, attrs: Attrs) -> Self {
        Self {
            fusion_id: fusion_id.into(),
            attrs,
        }
    }

    /// Look up an attribute by name
    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Whether an attribute is present
    pub fn contains(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Whether an attribute is present and set
    pub fn flag(&self, key: &str) -> bool {
        self.attrs.get(key).map(AttrValue::is_truthy).unwrap_or(false)
    }

    /// Numeric attribute lookup
    pub fn number(&self, key: &str) -> Option<f64> {
        self.attrs.get(key).and_then(AttrValue::as_f64)
    }

    /// Coherence score stamped by the fuser, 0.0 when absent
    pub fn coherence(&self) -> f64 {
        self.number("coherence_score").unwrap_or(0.0)
    }

    /// How many merges contributed; absent for single-input fusion
    pub fn synthesis_count(&self) -> Option<i64> {
        match self.attrs.get("synthesis_count") {
            Some(AttrValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// Whether the record carries the fusion compatibility marker
    pub fn is_compatible(&self) -> bool {
        self.flag("fusion_compatible")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_on_empty_record() {
        let record = CompositeRecord::new("fuse_0", Attrs::new());
        assert_eq!(record.coherence(), 0.0);
        assert_eq!(record.synthesis_count(), None);
        assert!(!record.is_compatible());
        assert!(!record.contains("resonance_frequency"));
    }

    #[test]
    fn test_accessors_on_populated_record() {
        let mut attrs = Attrs::new();
        attrs.insert("coherence_score".into(), AttrValue::Float(0.93));
        attrs.insert("synthesis_count".into(), AttrValue::Int(3));
        attrs.insert("fusion_compatible".into(), AttrValue::Bool(true));

        let record = CompositeRecord::new("fuse_1", attrs);
        assert_eq!(record.coherence(), 0.93);
        assert_eq!(record.synthesis_count(), Some(3));
        assert!(record.is_compatible());
    }
}
