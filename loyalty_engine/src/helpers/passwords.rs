use blake2::{Blake2b512, Digest};

/// Hashes a password with a random 16-byte salt. The result is `salt$digest`, both hex encoded.
pub fn hash_password(password: &str) -> String {
    let salt: [u8; 16] = rand::random();
    let digest = salted_digest(&salt, password);
    format!("{}${}", to_hex(&salt), to_hex(&digest))
}

/// Verifies a password against a stored `salt$digest` hash. Returns `false` on any malformed input rather than
/// erroring. A corrupt stored hash is indistinguishable from a wrong password to the caller.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, digest_hex)) = stored.split_once('$') else {
        return false;
    };
    let Some(salt) = from_hex(salt_hex) else {
        return false;
    };
    let Some(expected) = from_hex(digest_hex) else {
        return false;
    };
    let actual = salted_digest(&salt, password);
    // Fold over every byte so the comparison does not short-circuit on the first mismatch.
    actual.len() == expected.len()
        && actual.iter().zip(expected.iter()).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

fn salted_digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Blake2b512::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn from_hex(s: &str) -> Option<Vec<u8>> {
    if s.len() % 2 != 0 {
        return None;
    }
    (0..s.len()).step_by(2).map(|i| u8::from_str_radix(&s[i..i + 2], 16).ok()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("hunter2");
        assert!(verify_password("hunter2", &hash));
        assert!(!verify_password("hunter3", &hash));
    }

    #[test]
    fn salts_are_random() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }

    #[test]
    fn malformed_stored_hashes_never_verify() {
        for stored in ["", "nodollar", "xx$yy", "abcd$", "$abcd"] {
            assert!(!verify_password("hunter2", stored), "{stored:?} should not verify");
        }
    }
}
