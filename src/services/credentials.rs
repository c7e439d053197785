// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored format: `pbkdf2-sha256$<iterations>$<salt>$<hash>`, with salt and
//! hash base64-encoded (standard alphabet, no padding). The iteration count
//! is stored so it can be raised later without invalidating old hashes.

use crate::error::AppError;
use base64::{engine::general_purpose::STANDARD_NO_PAD as BASE64, Engine as _};
use ring::rand::{SecureRandom, SystemRandom};
use ring::{digest, pbkdf2};
use std::num::NonZeroU32;

static ALGORITHM: pbkdf2::Algorithm = pbkdf2::PBKDF2_HMAC_SHA256;
const SCHEME: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const HASH_LEN: usize = digest::SHA256_OUTPUT_LEN;

/// Hash a password with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate password salt")))?;

    let iterations = NonZeroU32::new(ITERATIONS)
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("PBKDF2 iterations must be non-zero")))?;

    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(ALGORITHM, iterations, &salt, password.as_bytes(), &mut hash);

    Ok(format!(
        "{}${}${}${}",
        SCHEME,
        ITERATIONS,
        BASE64.encode(salt),
        BASE64.encode(hash)
    ))
}

/// Check a password against a stored hash (constant time).
///
/// Malformed stored values never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    let [scheme, iterations, salt, hash] = parts.as_slice() else {
        return false;
    };
    if *scheme != SCHEME {
        return false;
    }

    let Some(iterations) = iterations.parse().ok().and_then(NonZeroU32::new) else {
        return false;
    };
    let (Ok(salt), Ok(hash)) = (BASE64.decode(salt), BASE64.decode(hash)) else {
        return false;
    };

    pbkdf2::verify(ALGORITHM, iterations, &salt, password.as_bytes(), &hash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let stored = hash_password("password123").unwrap();

        assert!(stored.starts_with("pbkdf2-sha256$100000$"));
        assert!(verify_password("password123", &stored));
        assert!(!verify_password("password124", &stored));
        assert!(!verify_password("", &stored));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_hash_never_contains_plaintext() {
        let stored = hash_password("hunter2-plaintext").unwrap();
        assert!(!stored.contains("hunter2-plaintext"));
    }

    #[test]
    fn test_malformed_hashes_rejected() {
        for stored in [
            "",
            "plaintext",
            "pbkdf2-sha256$100000$only-three",
            "bcrypt$10$abc$def",
            "pbkdf2-sha256$0$AAAA$AAAA",
            "pbkdf2-sha256$lots$AAAA$AAAA",
            "pbkdf2-sha256$1000$!!!$AAAA",
        ] {
            assert!(!verify_password("anything", stored), "{:?}", stored);
        }
    }
}
