//! SHA-256 digests used for run and prompt identity.

use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of `data`.
pub fn sha256_hex(data: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data.as_ref());
    hex::encode(hasher.finalize())
}

/// Digest of an ordered list of names, NUL-separated so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn ordered_names_digest<S: AsRef<str>>(names: &[S]) -> String {
    let mut hasher = Sha256::new();
    for name in names {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(b"\0");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_ordered_names_digest_is_order_sensitive() {
        let a = ordered_names_digest(&["plan", "flowchart"]);
        let b = ordered_names_digest(&["flowchart", "plan"]);
        assert_ne!(a, b);
        assert_eq!(a, ordered_names_digest(&["plan".to_string(), "flowchart".to_string()]));
        assert_ne!(ordered_names_digest(&["ab", "c"]), ordered_names_digest(&["a", "bc"]));
    }
}
