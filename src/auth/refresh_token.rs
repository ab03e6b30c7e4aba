/// Refresh Token Fingerprints
///
/// The account row never holds a refresh token in plaintext. It holds the
/// SHA-256 fingerprint of the one live token, and a presented token is only
/// accepted when its fingerprint matches. Overwriting or clearing the
/// fingerprint is what revokes a session.
use sha2::{Digest, Sha256};

/// Hash a refresh token using SHA-256 (lowercase hex)
pub fn fingerprint(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_hashing() {
        let token = "header.payload.signature";
        let hash1 = fingerprint(token);
        let hash2 = fingerprint(token);

        // Same token should produce same hash
        assert_eq!(hash1, hash2);
        // Hash should not equal plaintext
        assert_ne!(token, hash1);
        // Hash should be 64 chars (SHA-256 hex)
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_tokens_different_hashes() {
        assert_ne!(fingerprint("token-one"), fingerprint("token-two"));
    }
}
