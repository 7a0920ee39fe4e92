//! Metadata-addressed cache key generation.

use sha2::{Digest, Sha256};

/// Length of a cover cache key in hex characters.
pub const KEY_LEN: usize = 16;

/// Lower-case and trim a metadata field for keying.
pub fn normalize_field(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Compute the cover cache key for a (title, author) pair.
///
/// Pairs that are equal after normalization share a key, so two uploads of the
/// same book reuse one external lookup.
pub fn cover_cache_key(title: &str, author: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(normalize_field(title).as_bytes());
    hasher.update(b"|");
    hasher.update(normalize_field(author.unwrap_or_default()).as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(KEY_LEN);
    key
}

/// Whether `key` has the shape produced by [`cover_cache_key`].
pub fn is_valid_key(key: &str) -> bool {
    key.len() == KEY_LEN && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_stability() {
        let key1 = cover_cache_key("The Hobbit", Some("J.R.R. Tolkien"));
        let key2 = cover_cache_key("The Hobbit", Some("J.R.R. Tolkien"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_ignores_case_and_whitespace() {
        let key1 = cover_cache_key("  The Hobbit ", Some("J.R.R. Tolkien"));
        let key2 = cover_cache_key("the hobbit", Some(" j.r.r. tolkien "));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_missing_author_equals_empty_author() {
        assert_eq!(cover_cache_key("Dune", None), cover_cache_key("Dune", Some("   ")));
    }

    #[test]
    fn test_key_different_author() {
        let key1 = cover_cache_key("Dune", Some("Frank Herbert"));
        let key2 = cover_cache_key("Dune", Some("Brian Herbert"));
        assert_ne!(key1, key2);
    }

    #[test]
    fn test_separator_is_part_of_key() {
        assert_ne!(cover_cache_key("a|b", None), cover_cache_key("a", Some("b")));
    }

    #[test]
    fn test_unicode_lowercase() {
        assert_eq!(
            cover_cache_key("LES MISÉRABLES", Some("Victor Hugo")),
            cover_cache_key("les misérables", Some("victor hugo"))
        );
    }

    #[test]
    fn test_key_format() {
        let key = cover_cache_key("Dune", None);
        assert_eq!(key.len(), KEY_LEN);
        assert!(is_valid_key(&key));
    }

    #[test]
    fn test_is_valid_key_rejects_paths() {
        assert!(!is_valid_key("../../etc/passwd"));
        assert!(!is_valid_key("ABCDEF0123456789"));
        assert!(!is_valid_key("abc"));
    }
}
