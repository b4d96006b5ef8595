use std::collections::HashSet;

use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes behind a signing secret; hex encoding doubles the length.
const SIGNING_SECRET_BYTES: usize = 32;

/// Generate a long-lived signing secret from the OS random source.
///
/// Lowercase hex only, so the value embeds in `.env` files and shell
/// commands without quoting.
pub fn generate_signing_secret() -> String {
    let mut bytes = [0u8; SIGNING_SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Tracks secret values so they can be masked in output.
#[derive(Debug, Default)]
pub struct SecretRegistry {
    secret_values: HashSet<String>,
}

impl SecretRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value as secret (to be masked in output).
    pub fn track(&mut self, value: &str) {
        if !value.is_empty() {
            self.secret_values.insert(value.to_string());
        }
    }

    /// Replace any known secret substrings in `value` with `****`.
    pub fn mask_value(&self, value: &str) -> String {
        let mut result = value.to_string();
        for secret in &self.secret_values {
            result = result.replace(secret.as_str(), "****");
        }
        result
    }
}
