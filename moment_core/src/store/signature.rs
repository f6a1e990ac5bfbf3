//! Component J: store signatures.
//!
//! A signature is a 4-byte tag (e.g. `*b"strb"`) packed into a `u32` so
//! that a handle's high bits identify which `PersistentStore` minted it
//! without needing a central registry of store instances.

/// `make_signature([a,b,c,d]) = a | b<<8 | c<<16 | d<<24`: the tag's
/// first character sits in the low byte.
pub fn make_signature(tag: [u8; 4]) -> u32 {
    u32::from_le_bytes(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_tags_give_distinct_signatures() {
        assert_ne!(make_signature(*b"strb"), make_signature(*b"strc"));
    }

    #[test]
    fn signature_is_deterministic() {
        assert_eq!(make_signature(*b"strb"), make_signature(*b"strb"));
    }
}
