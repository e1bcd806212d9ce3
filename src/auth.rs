//! Gallery Vault - Accounts and Tokens
//!
//! Login passwords are stored as Argon2id PHC strings. They are unrelated
//! to gallery passwords, which are never stored anywhere.

use std::sync::Arc;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};
use crate::models::{AccessToken, User, UserId, UserOut};
use crate::repository::Repository;

/// Token type reported to clients
pub const TOKEN_TYPE: &str = "bearer";

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,
    /// Expiration timestamp
    pub exp: usize,
}

/// Identity of an authenticated caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
    pub username: String,
}

// ═══════════════════════════════════════════════════════════════════════════
// TOKENS
// ═══════════════════════════════════════════════════════════════════════════

/// HS256 token signer
pub struct TokenIssuer {
    secret: SecretString,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: SecretString, ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    /// Sign a new token for `username`
    pub fn sign(&self, username: &str) -> VaultResult<String> {
        let expiration = Utc::now()
            .checked_add_signed(self.ttl)
            .ok_or_else(|| VaultError::Token("token expiry out of range".into()))?
            .timestamp()
            .max(0);

        let claims = Claims {
            sub: username.to_owned(),
            exp: expiration as usize,
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.expose_secret().as_bytes()),
        )?)
    }

    /// Verify signature and expiry
    pub fn verify(&self, token: &str) -> VaultResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.expose_secret().as_bytes()),
            &Validation::default(),
        )?;
        Ok(data.claims)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// ACCOUNTS
// ═══════════════════════════════════════════════════════════════════════════

/// Registration, login and token checks
pub struct AuthService {
    repo: Arc<dyn Repository>,
    tokens: TokenIssuer,
}

impl AuthService {
    pub fn new(repo: Arc<dyn Repository>, tokens: TokenIssuer) -> Self {
        Self { repo, tokens }
    }

    pub fn register(&self, username: &str, password: &SecretString) -> VaultResult<UserOut> {
        if self.repo.get_user_by_username(username)?.is_some() {
            return Err(VaultError::UsernameTaken(username.to_string()));
        }

        let user = User::new(username, hash_password(password)?);
        self.repo.create_user(&user).map_err(|e| match e {
            VaultError::Conflict(_) => VaultError::UsernameTaken(username.to_string()),
            other => other,
        })?;

        log::info!("Registered user '{}'", user.username);
        Ok(UserOut::from(&user))
    }

    /// Unknown user and wrong password both give `InvalidCredentials`
    pub fn login(&self, username: &str, password: &SecretString) -> VaultResult<AccessToken> {
        let user = match self.repo.get_user_by_username(username)? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                log::warn!("Rejected login for '{}'", username);
                return Err(VaultError::InvalidCredentials);
            }
        };

        Ok(AccessToken {
            access_token: self.tokens.sign(&user.username)?,
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    pub fn authenticate(&self, token: &str) -> VaultResult<AuthContext> {
        let claims = self.tokens.verify(token).map_err(|e| {
            log::debug!("Token rejected: {}", e);
            VaultError::Unauthenticated
        })?;

        let user = self
            .repo
            .get_user_by_username(&claims.sub)?
            .ok_or(VaultError::Unauthenticated)?;

        Ok(AuthContext {
            user_id: user.id,
            username: user.username,
        })
    }
}

fn hash_password(password: &SecretString) -> VaultResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.expose_secret().as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| VaultError::Internal(format!("password hashing failed: {}", e)))
}

fn verify_password(password: &SecretString, phc: &str) -> bool {
    match PasswordHash::new(phc) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.expose_secret().as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}
