//! Prompt fingerprinting.

use sha2::{Digest, Sha256};

/// Stable hex SHA-256 fingerprint of a prompt template, for logs.
pub fn hash_prompt(prompt: &str) -> String {
    format!("{:x}", Sha256::digest(prompt.as_bytes()))
}
