//! Random identifiers and constant-time comparison.

use anyhow::{Context, Result};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

fn random_bytes() -> Result<[u8; 32]> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to read from the OS random source")?;
    Ok(bytes)
}

/// Create a new session id for the session cookie.
pub(crate) fn generate_session_id() -> Result<String> {
    Ok(Base64UrlUnpadded::encode_string(&random_bytes()?))
}

/// Create a new anti-forgery token: 256 random bits rendered as hex.
pub(crate) fn generate_csrf_token() -> Result<String> {
    Ok(hex::encode(random_bytes()?))
}

/// Hash a session id so raw values never touch the database.
pub(crate) fn hash_session_id(id: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(id.as_bytes());
    hasher.finalize().to_vec()
}

/// Compare two tokens without leaking the position of the first difference.
pub(crate) fn tokens_match(expected: &str, candidate: &str) -> bool {
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_url_safe_32_bytes() -> Result<()> {
        let id = generate_session_id()?;
        let decoded = Base64UrlUnpadded::decode_vec(&id).map_err(|e| anyhow::anyhow!("{e}"))?;
        assert_eq!(decoded.len(), 32);
        assert!(!id.contains('='));
        Ok(())
    }

    #[test]
    fn csrf_token_is_64_hex_chars() -> Result<()> {
        let token = generate_csrf_token()?;
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_csrf_token()?);
        Ok(())
    }

    #[test]
    fn hash_session_id_is_stable() {
        assert_eq!(hash_session_id("abc"), hash_session_id("abc"));
        assert_ne!(hash_session_id("abc"), hash_session_id("abd"));
        assert_eq!(hash_session_id("abc").len(), 32);
    }

    #[test]
    fn tokens_match_requires_exact_equality() {
        assert!(tokens_match("deadbeef", "deadbeef"));
        assert!(!tokens_match("deadbeef", "deadbeee"));
        assert!(!tokens_match("deadbeef", "deadbeef00"));
        assert!(!tokens_match("deadbeef", ""));
    }
}
