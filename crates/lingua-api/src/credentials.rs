use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Stand-in hash checked when no account matches, so a missing user costs
/// the same Argon2 verification as a wrong password.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("lingua-absent-user").ok());

#[cfg(test)]
thread_local! {
    static ARGON2_VERIFICATIONS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// Hash a password for storage as an Argon2id PHC string (salted).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Password hashing failed: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored hash.
///
/// Accounts created before the switch to Argon2 hold a bare, unsalted
/// SHA-256 hex digest. Those still verify, compared in constant time.
pub fn verify_password(password: &str, stored: &str) -> Result<bool> {
    if is_legacy_digest(stored) {
        let computed = hex::encode(Sha256::digest(password.as_bytes()));
        return Ok(computed.as_bytes().ct_eq(stored.as_bytes()).into());
    }

    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("Stored hash is unreadable: {}", e))?;
    #[cfg(test)]
    ARGON2_VERIFICATIONS.with(|n| n.set(n.get() + 1));
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Verify a login attempt against the account's stored hash, or against
/// `DUMMY_HASH` when there is no account. A missing account never matches.
pub fn verify_account(password: &str, stored: Option<&str>) -> Result<bool> {
    match stored {
        Some(stored) => verify_password(password, stored),
        None => {
            match DUMMY_HASH.as_deref() {
                Some(dummy) => {
                    verify_password(password, dummy)?;
                }
                None => {
                    hash_password(password)?;
                }
            }
            Ok(false)
        }
    }
}

fn is_legacy_digest(stored: &str) -> bool {
    stored.len() == 64 && stored.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
