//! Gallery Vault - Error Types

use thiserror::Error;

use crate::crypto::CryptoError;

/// Result type for vault operations
pub type VaultResult<T> = Result<T, VaultError>;

/// Vault error types
#[derive(Error, Debug)]
pub enum VaultError {
    // ═══════════════════════════════════════════════════════════════
    // CRYPTO ERRORS
    // ═══════════════════════════════════════════════════════════════

    /// Wrong gallery password or corrupted envelope; callers cannot tell
    /// which.
    #[error("Decryption failed")]
    DecryptionFailed,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    // ═══════════════════════════════════════════════════════════════
    // LOOKUP ERRORS
    // ═══════════════════════════════════════════════════════════════

    /// Missing, or owned by someone else.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Conflict: {0}")]
    Conflict(String),

    // ═══════════════════════════════════════════════════════════════
    // FILTER ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Invalid filter name: {0}. Available filters: none, sepia, black and white, color inversion")]
    InvalidFilter(String),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Image encoding failed: {0}")]
    ImageEncoding(String),

    // ═══════════════════════════════════════════════════════════════
    // AUTH ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Username already registered: {0}")]
    UsernameTaken(String),

    #[error("Token error: {0}")]
    Token(String),

    // ═══════════════════════════════════════════════════════════════
    // INFRASTRUCTURE ERRORS
    // ═══════════════════════════════════════════════════════════════

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VaultError {
    /// HTTP status the excluded web layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            VaultError::NotFound(_) => 404,
            VaultError::Conflict(_) => 409,
            VaultError::DecryptionFailed
            | VaultError::InvalidFilter(_)
            | VaultError::InvalidImage(_)
            | VaultError::UsernameTaken(_) => 400,
            VaultError::Unauthenticated | VaultError::InvalidCredentials => 401,
            _ => 500,
        }
    }

    /// Check if this error was caused by the caller's input rather than
    /// by the vault or its storage
    pub fn is_user_error(&self) -> bool {
        self.status_code() < 500
    }

    /// Check if this is a security-relevant error
    pub fn is_security_critical(&self) -> bool {
        matches!(
            self,
            VaultError::DecryptionFailed
                | VaultError::Unauthenticated
                | VaultError::InvalidCredentials
        )
    }
}

impl From<CryptoError> for VaultError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::AuthenticationFailure => VaultError::DecryptionFailed,
            CryptoError::Encryption(msg) => VaultError::EncryptionFailed(msg),
        }
    }
}

impl From<rusqlite::Error> for VaultError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref err, ref msg)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                VaultError::Conflict(msg.clone().unwrap_or_else(|| err.to_string()))
            }
            other => VaultError::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(e: serde_json::Error) -> Self {
        VaultError::Serialization(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for VaultError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        VaultError::Token(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(VaultError::NotFound("Photo").status_code(), 404);
        assert_eq!(VaultError::Conflict("Subject already exists".into()).status_code(), 409);
        assert_eq!(VaultError::DecryptionFailed.status_code(), 400);
        assert_eq!(VaultError::Unauthenticated.status_code(), 401);
        assert_eq!(VaultError::Database("down".into()).status_code(), 500);
        assert!(!VaultError::Internal("join".into()).is_user_error());
    }

    #[test]
    fn test_authentication_failure_becomes_decryption_failed() {
        let err: VaultError = CryptoError::AuthenticationFailure.into();
        assert!(matches!(err, VaultError::DecryptionFailed));
        assert!(err.is_security_critical());
        assert_eq!(err.to_string(), "Decryption failed");
    }
}
