//! API Key Authentication
//!
//! The gate is the only internet-facing component and authenticates every
//! request with a single shared secret carried in the `X-API-Key` header.
//! The secret is configured once at startup and never mutated.
//!
//! Keys are compared with constant-time equality to prevent timing attacks.
//! A missing header fails the same way as a wrong key.

use std::fmt;

/// Header carrying the shared secret.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Authentication context for the gate.
///
/// Holds the shared secret all callers must present. Unlike an optional
/// auth layer there is no disabled mode: the gate always authenticates.
#[derive(Clone)]
pub struct AuthConfig {
    api_key: String,
}

impl AuthConfig {
    /// Creates an auth context from the configured shared secret.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
        }
    }

    /// Validates the key presented by a caller.
    ///
    /// `None` (header absent) is always rejected. Present keys are compared
    /// in constant time against the configured secret.
    pub fn validate(&self, provided: Option<&str>) -> bool {
        match provided {
            Some(key) => constant_time_eq(&self.api_key, key),
            None => false,
        }
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never leak the secret through debug logging
        write!(f, "AuthConfig(*****)")
    }
}

/// Constant-time string comparison.
///
/// Iterates over the full length of both inputs regardless of where the
/// first difference occurs, so response timing reveals nothing about how
/// much of a guessed key was correct.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (byte_a, byte_b) in a.bytes().zip(b.bytes()) {
        diff |= byte_a ^ byte_b;
    }

    diff == 0
}
