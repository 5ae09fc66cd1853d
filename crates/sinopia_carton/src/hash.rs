//! Fast hashing utilities using xxHash3.
//!
//! Provides content-based keys for the compiled template cache.

use xxhash_rust::xxh3::{xxh3_64, Xxh3};

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Compute a single hash over several string parts.
///
/// Parts are length-prefixed so `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_parts<'a>(parts: impl IntoIterator<Item = &'a str>) -> u64 {
    let mut hasher = Xxh3::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part.as_bytes());
    }
    hasher.digest()
}

/// Convert a hash to a hex string (16 characters).
#[inline]
pub fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_consistency() {
        assert_eq!(hash_str("<li>{{ item }}</li>"), hash_str("<li>{{ item }}</li>"));
        assert_ne!(hash_str("Hello"), hash_str("World"));
    }

    #[test]
    fn test_hash_parts_boundaries() {
        assert_ne!(hash_parts(["ab", "c"]), hash_parts(["a", "bc"]));
        assert_eq!(hash_parts(["each", "attr"]), hash_parts(["each", "attr"]));
    }

    #[test]
    fn test_hex_format() {
        let hex = hash_to_hex(hash_str("test"));
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
