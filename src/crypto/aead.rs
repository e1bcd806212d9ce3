//! Gallery Vault - AEAD Encryption
//!
//! AES-256-GCM with the authentication tag kept apart from the ciphertext,
//! so an envelope stores `ciphertext`, `nonce` and `tag` as separate columns.

use aes_gcm::{
    aead::{AeadInPlace, KeyInit},
    Aes256Gcm, Nonce, Tag,
};
use thiserror::Error;

use super::keys::{generate_nonce, VaultKey, NONCE_LEN, TAG_LEN};

/// Errors raised by the cipher itself
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Tag mismatch: wrong key, or ciphertext/nonce/tag were altered
    #[error("Authentication failed")]
    AuthenticationFailure,

    #[error("Encryption failed: {0}")]
    Encryption(String),
}

/// Output of a single encryption
#[derive(Debug, Clone)]
pub struct Sealed {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
}

/// Encrypt with AES-256-GCM under a fresh random nonce
pub fn encrypt(plaintext: &[u8], key: &VaultKey) -> Result<Sealed, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let nonce = generate_nonce();
    let mut buffer = plaintext.to_vec();

    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut tag_bytes = [0u8; TAG_LEN];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(Sealed {
        ciphertext: buffer,
        nonce,
        tag: tag_bytes,
    })
}

/// Decrypt with AES-256-GCM.
///
/// The tag is verified before anything is returned; any failure is reported
/// as [`CryptoError::AuthenticationFailure`].
pub fn decrypt(
    ciphertext: &[u8],
    nonce: &[u8; NONCE_LEN],
    tag: &[u8; TAG_LEN],
    key: &VaultKey,
) -> Result<Vec<u8>, CryptoError> {
    let cipher = Aes256Gcm::new_from_slice(key.expose())
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    let mut buffer = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(tag),
        )
        .map_err(|_| CryptoError::AuthenticationFailure)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aes_gcm_roundtrip() {
        let key = VaultKey::generate();
        let plaintext = b"Gallery Vault - Top Secret Photo Data";

        let sealed = encrypt(plaintext, &key).unwrap();
        assert_eq!(sealed.ciphertext.len(), plaintext.len());

        let decrypted = decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag, &key).unwrap();
        assert_eq!(plaintext.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = VaultKey::generate();
        let key2 = VaultKey::generate();

        let sealed = encrypt(b"Secret data", &key1).unwrap();
        let result = decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag, &key2);

        assert_eq!(result, Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn test_tampered_parts_fail() {
        let key = VaultKey::generate();
        let sealed = encrypt(b"Secret photo", &key).unwrap();

        let mut ciphertext = sealed.ciphertext.clone();
        ciphertext[3] ^= 0x01;
        assert!(decrypt(&ciphertext, &sealed.nonce, &sealed.tag, &key).is_err());

        let mut nonce = sealed.nonce;
        nonce[0] ^= 0x80;
        assert!(decrypt(&sealed.ciphertext, &nonce, &sealed.tag, &key).is_err());

        let mut tag = sealed.tag;
        tag[15] ^= 0x01;
        assert!(decrypt(&sealed.ciphertext, &sealed.nonce, &tag, &key).is_err());
    }

    #[test]
    fn test_empty_plaintext() {
        let key = VaultKey::generate();
        let sealed = encrypt(b"", &key).unwrap();
        assert!(sealed.ciphertext.is_empty());
        assert!(decrypt(&sealed.ciphertext, &sealed.nonce, &sealed.tag, &key)
            .unwrap()
            .is_empty());
    }
}
