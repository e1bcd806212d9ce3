//! Gallery Vault - Password Key Derivation
//!
//! PBKDF2-HMAC-SHA256 turns a gallery password and a per-envelope salt into
//! an AES-256 key. The parameters below are baked into every stored envelope:
//! changing either one makes all existing photos undecryptable.

use sha2::Sha256;
use zeroize::Zeroizing;

use super::keys::{VaultKey, KEY_LEN, SALT_LEN};

/// PBKDF2 iteration count
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Derive an encryption key from a gallery password.
///
/// Deterministic for a fixed `(password, salt)` pair.
pub fn derive_key(password: &str, salt: &[u8; SALT_LEN]) -> VaultKey {
    let mut okm = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut *okm);
    VaultKey::new(*okm)
}
