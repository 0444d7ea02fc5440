use sha2::{Digest, Sha256};

/// Stable lookup key for a receipt url. The hex digest doubles as the id of
/// the `receipt_urls` row, so a url resolves with a single point read.
pub fn make_hash(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::make_hash;

    #[test]
    fn hash_is_stable() {
        assert_eq!(
            make_hash("https://example.com/receipt/42"),
            make_hash("https://example.com/receipt/42")
        );
    }

    #[test]
    fn hash_is_hex_sha256() {
        let hash = make_hash("https://example.com/receipt/42");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn different_urls_hash_differently() {
        assert_ne!(
            make_hash("https://example.com/receipt/42"),
            make_hash("https://example.com/receipt/43")
        );
    }
}
