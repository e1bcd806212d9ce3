//! Gallery Vault - Cryptographic Core
//!
//! Password-derived AES-256-GCM envelopes for photo bytes.

pub mod keys;
pub mod kdf;
pub mod aead;
pub mod envelope;

pub use keys::*;
pub use kdf::{derive_key, PBKDF2_ROUNDS};
pub use aead::CryptoError;
pub use envelope::EncryptedBlob;
