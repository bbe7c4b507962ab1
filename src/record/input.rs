//! Input records: tagged content fragments submitted for fusion

use super::value::AttrValue;
use serde::{Deserialize, Serialize};

/// Classification of an input fragment
///
/// The tag drives normalization: each variant contributes its own derived
/// attributes before merging (see `fusion::normalize`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTag {
    /// Meaning-bearing content: enriched with symbolic mappings
    Semantic,
    /// Surrounding-context content: enriched with field coordinates
    Contextual,
    /// Provenance/history content: enriched with momentum attributes
    Historical,
    /// Numeric embedding content: enriched with harmonic coefficients
    Vector,
}

impl InputTag {
    /// All tags, in declaration order
    pub const ALL: [InputTag; 4] = [
        InputTag::Semantic,
        InputTag::Contextual,
        InputTag::Historical,
        InputTag::Vector,
    ];

    /// Canonical name used in serialized records and the CLI
    pub fn name(&self) -> &'static str {
        match self {
            InputTag::Semantic => "semantic",
            InputTag::Contextual => "contextual",
            InputTag::Historical => "historical",
            InputTag::Vector => "vector",
        }
    }

    /// Parse a tag from its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "semantic" => Some(InputTag::Semantic),
            "contextual" => Some(InputTag::Contextual),
            "historical" => Some(InputTag::Historical),
            "vector" => Some(InputTag::Vector),
            _ => None,
        }
    }
}

impl std::fmt::Display for InputTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One tagged content fragment submitted for fusion
///
/// Immutable once constructed; consumed by a single fusion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputRecord {
    /// Arbitrary structured content
    pub content: AttrValue,
    /// Fragment classification
    pub tag: InputTag,
}

impl InputRecord {
    /// Create a new input record
    pub fn new(content: impl Into<AttrValue>, tag: InputTag) -> Self {
        Self {
            content: content.into(),
            tag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names_round_trip() {
        for tag in InputTag::ALL {
            assert_eq!(InputTag::from_name(tag.name()), Some(tag));
        }
        assert_eq!(InputTag::from_name("glyph_cascade"), None);
    }

    #[test]
    fn test_tag_serde_snake_case() {
        let json = serde_json::to_string(&InputTag::Semantic).unwrap();
        assert_eq!(json, "\"semantic\"");
        let tag: InputTag = serde_json::from_str("\"vector\"").unwrap();
        assert_eq!(tag, InputTag::Vector);
    }

    #[test]
    fn test_input_record_construction() {
        let record = InputRecord::new("observation", InputTag::Historical);
        assert_eq!(record.tag, InputTag::Historical);
        assert_eq!(record.content, AttrValue::from("observation"));
    }
}
