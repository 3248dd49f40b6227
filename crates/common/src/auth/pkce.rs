//! PKCE (Proof Key for Code Exchange) implementation for OAuth 2.0
//!
//! Implements RFC 7636 for secure OAuth authorization without client secrets.
//! Used for desktop applications where client secrets cannot be safely stored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure code verifier
///
/// Returns a URL-safe base64-encoded random string of 32 bytes (43 characters).
/// Per RFC 7636, verifiers must be 43-128 characters long.
///
/// # Errors
/// Returns error if random number generation fails (extremely rare)
pub fn generate_code_verifier() -> Result<String, String> {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    Ok(URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Generate code challenge from verifier using SHA256
///
/// Per RFC 7636, the challenge is BASE64URL(SHA256(ASCII(code_verifier)))
///
/// # Errors
/// Returns error if encoding fails
pub fn generate_code_challenge(verifier: &str) -> Result<String, String> {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let hash = hasher.finalize();
    Ok(URL_SAFE_NO_PAD.encode(hash))
}

/// Generate a random state token for CSRF protection
///
/// # Errors
/// Returns error if random number generation fails (extremely rare)
pub fn generate_state() -> Result<String, String> {
    let mut rng = rand::thread_rng();
    let random_bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    Ok(URL_SAFE_NO_PAD.encode(random_bytes))
}

/// Validate that the state token matches
pub fn validate_state(expected: &str, actual: &str) -> bool {
    expected == actual
}

/// PKCE challenge pair for OAuth 2.0 authorization
///
/// Contains the code verifier (sent during token exchange) and the
/// code challenge (sent during authorization request). Ephemeral: scoped to
/// one authorization attempt, never persisted, discarded after the exchange.
#[derive(Debug, Clone)]
pub struct PkceChallenge {
    /// Random string (43-128 chars, base64url encoded)
    /// Kept secret until token exchange
    pub code_verifier: String,

    /// SHA256 hash of code_verifier (base64url encoded)
    /// Sent in authorization request for server validation
    pub code_challenge: String,

    /// Random CSRF protection token
    /// Must match between authorization request and callback
    pub state: String,
}

impl PkceChallenge {
    /// Generate a new PKCE challenge with cryptographically secure random
    /// values
    ///
    /// # Errors
    /// Returns error if cryptographic random number generation fails
    /// (extremely rare)
    pub fn generate() -> Result<Self, String> {
        let code_verifier = generate_code_verifier()?;
        let code_challenge = generate_code_challenge(&code_verifier)?;
        let state = generate_state()?;

        Ok(Self { code_verifier, code_challenge, state })
    }

    /// Get the challenge method (always "S256" for SHA256)
    #[must_use]
    pub fn challenge_method(&self) -> &str {
        "S256"
    }
}
