//! HMAC-SHA256 helpers backing the signing key chain.

use hmac::Hmac;
use hmac::Mac;
use sha2::Sha256;

/// Raw HMAC-SHA256 digest of `content` under `key`.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> Vec<u8> {
    // SAFETY: HMAC's new_from_slice accepts keys of any length
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(content);

    mac.finalize().into_bytes().to_vec()
}

/// Lowercase hex HMAC-SHA256 digest, encoded without the intermediate `Vec`.
pub fn hex_hmac_sha256(key: &[u8], content: &[u8]) -> String {
    // SAFETY: HMAC's new_from_slice accepts keys of any length
    let mut mac = Hmac::<Sha256>::new_from_slice(key).unwrap();
    mac.update(content);

    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_hmac_sha256_is_deterministic() {
        let a = hex_hmac_sha256(b"secret", b"payload");
        let b = hex_hmac_sha256(b"secret", b"payload");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        assert_ne!(a, hex_hmac_sha256(b"secret", b"payloae"));
        assert_ne!(a, hex_hmac_sha256(b"secres", b"payload"));
    }

    #[test]
    fn test_hex_matches_raw() {
        assert_eq!(
            hex_hmac_sha256(b"k", b"m"),
            hex::encode(hmac_sha256(b"k", b"m"))
        );
    }
}
