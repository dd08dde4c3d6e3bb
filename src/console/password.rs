//! Argon2id password hashing and strength rules.

use anyhow::{anyhow, Result};
use argon2::{password_hash::SaltString, Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use std::sync::OnceLock;

const MIN_PASSWORD_LEN: usize = 8;

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| anyhow!("failed to hash password"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a stored PHC string.
///
/// An unparsable stored hash is treated as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

fn decoy_hash() -> Option<&'static str> {
    static DECOY_HASH: OnceLock<Option<String>> = OnceLock::new();
    DECOY_HASH
        .get_or_init(|| hash_password("decoy-password-0").ok())
        .as_deref()
}

/// Run a full verification against a throwaway hash, so a lookup miss costs
/// as much as a real password check.
pub fn verify_decoy(password: &str) {
    if let Some(hash) = decoy_hash() {
        let _ = verify_password(password, hash);
    }
}

/// Strength problems with a new password; empty when acceptable.
#[must_use]
pub fn password_problems(password: &str) -> Vec<String> {
    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LEN {
        problems.push(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        ));
    }
    if !password.chars().any(char::is_alphabetic) {
        problems.push("Password must contain at least one letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain at least one digit".to_string());
    }
    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() -> Result<()> {
        let hash = hash_password("Secret123")?;
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("Secret123", &hash));
        assert!(!verify_password("secret123", &hash));
        Ok(())
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("Secret123")?;
        let second = hash_password("Secret123")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn decoy_hash_uses_live_parameters() -> Result<()> {
        let live = hash_password("Secret123")?;
        let params = |hash: &str| hash.split('$').take(4).collect::<Vec<_>>().join("$");
        assert_eq!(decoy_hash().map(params), Some(params(&live)));
        assert!(!verify_password("Secret123", decoy_hash().unwrap_or_default()));
        verify_decoy("Secret123");
        Ok(())
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password("Secret123", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn password_problems_reports_each_rule() {
        assert!(password_problems("Secret123").is_empty());
        assert_eq!(password_problems("abc1").len(), 1);
        assert_eq!(password_problems("12345678").len(), 1);
        assert_eq!(password_problems("abcdefgh").len(), 1);
        assert_eq!(password_problems("").len(), 3);
    }
}
