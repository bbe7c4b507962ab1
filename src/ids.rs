//! Short run identifiers

use uuid::Uuid;

/// Prefixed 8-hex-digit identifier, e.g. `fuse_1a2b3c4d`
pub(crate) fn short_id(prefix: &str) -> String {
    format!("{}_{}", prefix, short_hex(8))
}

/// Random hex fragment of the given length (at most 32)
pub(crate) fn short_hex(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len.min(hex.len())].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_shape() {
        let id = short_id("fuse");
        assert!(id.starts_with("fuse_"));
        assert_eq!(id.len(), "fuse_".len() + 8);
    }

    #[test]
    fn test_short_hex_is_unique_enough() {
        assert_ne!(short_hex(8), short_hex(8));
    }
}
