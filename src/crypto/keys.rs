//! Gallery Vault - Key Material
//!
//! Secret wrapper for derived keys and the random salt/nonce sources.

use rand::RngCore;
use secrecy::{ExposeSecret, Secret};

/// Key length for AES-256
pub const KEY_LEN: usize = 32;

/// Salt length for password-based key derivation
pub const SALT_LEN: usize = 16;

/// Nonce length for AES-GCM
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length
pub const TAG_LEN: usize = 16;

/// Secure key wrapper with automatic zeroization
pub struct VaultKey {
    inner: Secret<[u8; KEY_LEN]>,
}

impl VaultKey {
    /// Create a new vault key from bytes
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self {
            inner: Secret::new(bytes),
        }
    }

    /// Expose the key bytes (use with caution)
    pub fn expose(&self) -> &[u8; KEY_LEN] {
        self.inner.expose_secret()
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self::new(bytes)
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("VaultKey([REDACTED])")
    }
}

/// Generate a random salt for key derivation
pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

/// Generate a random nonce for AES-GCM
pub fn generate_nonce() -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut nonce);
    nonce
}
