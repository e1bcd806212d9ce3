//! Gallery Vault - Configuration

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::VaultResult;

/// Environment variable that overrides [`GalleryConfig::jwt_secret`]
pub const JWT_SECRET_ENV: &str = "GALLERY_JWT_SECRET";

/// Placeholder signing secret shipped in the defaults
pub const DEFAULT_JWT_SECRET: &str = "change-me";

/// Gallery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    /// SQLite database file
    pub database_path: PathBuf,
    /// HS256 signing secret for access tokens
    pub jwt_secret: String,
    /// Access token lifetime
    pub token_ttl_minutes: i64,
    /// Use the colour classifier for "noSubject" uploads
    pub classifier_enabled: bool,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("gallery.db"),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_minutes: 30,
            classifier_enabled: true,
        }
    }
}

impl GalleryConfig {
    /// Read a JSON config file if it exists, then apply environment overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> VaultResult<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(path)?)?
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env(std::env::var(JWT_SECRET_ENV).ok());
        Ok(config)
    }

    /// True while tokens would be signed with [`DEFAULT_JWT_SECRET`]
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }

    fn apply_env(&mut self, jwt_secret: Option<String>) {
        if let Some(secret) = jwt_secret.filter(|s| !s.is_empty()) {
            self.jwt_secret = secret;
        }
    }

    /// Write as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> VaultResult<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
