//! Utility functions shared across handlers

use anyhow::{Result, anyhow};
use sha2::{Digest, Sha256};

/// Parse a decimal string to fixed-point representation
///
/// Converts a decimal string to a fixed-point integer representation
/// with 4 decimal places (10000 = 1.0)
pub fn parse_fixed_point(value: &str) -> Result<i64> {
    let parsed = value
        .parse::<f64>()
        .map_err(|e| anyhow!("Failed to parse '{}' as number: {}", value, e))?;

    // Monetary inputs stay far below the i64 fixed-point range.
    #[allow(clippy::cast_possible_truncation)]
    Ok((parsed * 10000.0).round() as i64)
}

/// Convert fixed-point value back to string representation
#[allow(clippy::cast_precision_loss)]
pub fn fixed_point_to_string(value: i64) -> String {
    format!("{:.4}", value as f64 / 10000.0)
}

/// The platform password-hash function. Passwords leave the gateway only in
/// this form; the identity backend stores and compares hashes.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Deterministic credential for OAuth identities: the same provider subject
/// and email always derive the same password, so a returning OAuth user can
/// log in without separate account linkage.
#[must_use]
pub fn derive_oauth_password(subject: &str, email: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(subject.as_bytes());
    hasher.update(b":");
    hasher.update(email.as_bytes());
    hex::encode(hasher.finalize())
}
