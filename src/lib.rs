//! # Gallery Vault
//!
//! Per-user encrypted photo gallery with non-destructive filters and
//! subject tagging.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      GALLERY API                          │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────┐  │
//! │  │  AUTH       │  │  SUBJECTS   │  │  FILTER PIPELINE │  │
//! │  │  Argon2+JWT │  │  + CLASSIFY │  │  original→current│  │
//! │  └──────┬──────┘  └──────┬──────┘  └────────┬─────────┘  │
//! │         │                │                   │            │
//! │  ┌──────┴────────────────┴───────────────────┴─────────┐  │
//! │  │           ENCRYPTED OBJECT STORE (Photo)            │  │
//! │  │    PBKDF2-SHA256 → AES-256-GCM, detached tag        │  │
//! │  └──────────────────────────┬──────────────────────────┘  │
//! │                             │                             │
//! │  ┌──────────────────────────┴──────────────────────────┐  │
//! │  │          REPOSITORY (SQLite / in-memory)            │  │
//! │  └─────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Model
//!
//! - Every photo is sealed under a gallery password the server never stores
//! - Fresh salt and nonce for every envelope, including filter output
//! - Wrong password and tampered data fail the same way
//! - The uploaded original is never re-encrypted or overwritten
//! - Derived keys are zeroized on drop

pub mod crypto;
pub mod error;
pub mod models;
pub mod store;
pub mod repository;
pub mod classifier;
pub mod subjects;
pub mod filters;
pub mod pipeline;
pub mod auth;
pub mod config;
pub mod api;
pub mod nonblocking;

pub use error::{VaultError, VaultResult};
pub use models::{AccessToken, PhotoSummary, Subject, User, UserOut};
pub use store::Photo;
pub use repository::{MemoryRepository, Repository, SqliteRepository};
pub use classifier::{Classifier, ColorClassifier, DisabledClassifier};
pub use filters::{Filter, StandardFilters};
pub use pipeline::FilterPipeline;
pub use auth::AuthContext;
pub use config::GalleryConfig;
pub use api::{GalleryApi, UploadRequest};
pub use nonblocking::AsyncGallery;

/// Gallery Vault version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
