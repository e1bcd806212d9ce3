//! Gallery Vault - Encrypted Envelope
//!
//! An [`EncryptedBlob`] is everything needed to get a plaintext back given the
//! gallery password: `ciphertext`, the KDF `salt`, the GCM `nonce` and `tag`.
//! All four are produced together by [`EncryptedBlob::seal`] and a blob is only
//! ever replaced as a whole.

use secrecy::{ExposeSecret, SecretString};

use super::aead::{self, CryptoError};
use super::kdf::derive_key;
use super::keys::{generate_salt, NONCE_LEN, SALT_LEN, TAG_LEN};

/// Authenticated encryption envelope
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    ciphertext: Vec<u8>,
    salt: [u8; SALT_LEN],
    nonce: [u8; NONCE_LEN],
    tag: [u8; TAG_LEN],
}

impl EncryptedBlob {
    /// Encrypt `plaintext` under a key derived from `password` and a fresh salt.
    ///
    /// Salt and nonce are both drawn fresh on every call.
    pub fn seal(plaintext: &[u8], password: &SecretString) -> Result<Self, CryptoError> {
        let salt = generate_salt();
        let key = derive_key(password.expose_secret(), &salt);
        let sealed = aead::encrypt(plaintext, &key)?;

        Ok(Self {
            ciphertext: sealed.ciphertext,
            salt,
            nonce: sealed.nonce,
            tag: sealed.tag,
        })
    }

    /// Decrypt with `password`, verifying the tag first.
    pub fn open(&self, password: &SecretString) -> Result<Vec<u8>, CryptoError> {
        let key = derive_key(password.expose_secret(), &self.salt);
        aead::decrypt(&self.ciphertext, &self.nonce, &self.tag, &key)
    }

    /// Reassemble a blob read back from storage
    pub fn from_parts(
        ciphertext: Vec<u8>,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_LEN],
        tag: [u8; TAG_LEN],
    ) -> Self {
        Self {
            ciphertext,
            salt,
            nonce,
            tag,
        }
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn tag(&self) -> &[u8; TAG_LEN] {
        &self.tag
    }

    /// Encrypted payload size in bytes
    pub fn len(&self) -> usize {
        self.ciphertext.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ciphertext.is_empty()
    }
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("len", &self.ciphertext.len())
            .field("salt", &hex::encode(self.salt))
            .field("nonce", &hex::encode(self.nonce))
            .field("tag", &hex::encode(self.tag))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pw(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let blob = EncryptedBlob::seal(b"redsquare", &pw("pw1")).unwrap();
        assert_eq!(blob.open(&pw("pw1")).unwrap(), b"redsquare");
    }

    #[test]
    fn test_wrong_password_rejected() {
        let blob = EncryptedBlob::seal(b"redsquare", &pw("pw1")).unwrap();
        assert_eq!(blob.open(&pw("pw2")), Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn test_salt_and_nonce_are_fresh() {
        let a = EncryptedBlob::seal(b"same", &pw("pw1")).unwrap();
        let b = EncryptedBlob::seal(b"same", &pw("pw1")).unwrap();

        assert_ne!((a.salt(), a.nonce()), (b.salt(), b.nonce()));
        assert_ne!(a.ciphertext(), b.ciphertext());
    }

    #[test]
    fn test_bit_flips_are_detected() {
        let password = pw("pw1");
        let blob = EncryptedBlob::seal(b"abc", &password).unwrap();

        for byte in 0..blob.len() {
            let mut tampered = blob.clone();
            tampered.ciphertext[byte] ^= 0x04;
            assert!(tampered.open(&password).is_err());
        }
        for byte in [0, NONCE_LEN - 1] {
            let mut tampered = blob.clone();
            tampered.nonce[byte] ^= 0x01;
            assert!(tampered.open(&password).is_err());
        }
        for byte in [0, TAG_LEN - 1] {
            let mut tampered = blob.clone();
            tampered.tag[byte] ^= 0x10;
            assert!(tampered.open(&password).is_err());
        }
    }

    #[test]
    fn test_debug_hides_ciphertext() {
        let blob = EncryptedBlob::seal(b"redsquare", &pw("pw1")).unwrap();
        let rendered = format!("{:?}", blob);
        assert!(rendered.contains("len: 9"));
        assert!(!rendered.contains("ciphertext"));
    }
}
