//! Gallery Vault - Unified Public API
//!
//! Single entry point for every gallery operation. A web layer authenticates
//! the bearer token with [`GalleryApi::authenticate`] and passes the
//! resulting [`AuthContext`] into each call. Photos and subjects owned by
//! someone else look exactly like missing ones.

use std::sync::Arc;

use chrono::Duration;
use secrecy::SecretString;

use crate::auth::{AuthContext, AuthService, TokenIssuer};
use crate::classifier::{
    label_or_fallback, Classifier, ColorClassifier, DisabledClassifier, NO_SUBJECT, UNCLASSIFIED,
};
use crate::config::{GalleryConfig, JWT_SECRET_ENV};
use crate::error::{VaultError, VaultResult};
use crate::filters::StandardFilters;
use crate::models::{AccessToken, PhotoId, PhotoSummary, Subject, SubjectId, UserId, UserOut};
use crate::pipeline::FilterPipeline;
use crate::repository::Repository;
use crate::store::{detect_mime, NewPhoto, Photo};
use crate::subjects::SubjectCatalog;

/// Upload payload
#[derive(Clone)]
pub struct UploadRequest {
    pub filename: String,
    /// Sniffed from the bytes when absent
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
    /// `"noSubject"` asks for classification; empty or absent means none
    pub subject_name: Option<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// GALLERY API - THE ONLY PUBLIC INTERFACE
// ═══════════════════════════════════════════════════════════════════════════════

/// Gallery API
///
/// # Example
///
/// ```rust,ignore
/// use gallery_vault::{GalleryApi, GalleryConfig, SqliteRepository};
///
/// let config = GalleryConfig::load("gallery.json")?;
/// let repo = Arc::new(SqliteRepository::open(&config.database_path)?);
/// let api = GalleryApi::from_config(repo, &config);
///
/// api.register("alice", &login_pw)?;
/// let token = api.login("alice", &login_pw)?;
/// let ctx = api.authenticate(&token.access_token)?;
///
/// let photo = api.upload_photo(&ctx, request, &gallery_pw)?;
/// let (bytes, mime) = api.get_photo(&ctx, photo.id, &gallery_pw)?;
/// ```
pub struct GalleryApi {
    repo: Arc<dyn Repository>,
    classifier: Arc<dyn Classifier>,
    subjects: SubjectCatalog,
    pipeline: FilterPipeline<StandardFilters>,
    auth: AuthService,
}

impl GalleryApi {
    // ═══════════════════════════════════════════════════════════════════════
    // INITIALIZATION
    // ═══════════════════════════════════════════════════════════════════════

    pub fn new(repo: Arc<dyn Repository>, classifier: Arc<dyn Classifier>, tokens: TokenIssuer) -> Self {
        Self {
            subjects: SubjectCatalog::new(repo.clone()),
            pipeline: FilterPipeline::new(StandardFilters),
            auth: AuthService::new(repo.clone(), tokens),
            repo,
            classifier,
        }
    }

    /// Build with the classifier and token settings from `config`
    pub fn from_config(repo: Arc<dyn Repository>, config: &GalleryConfig) -> Self {
        if config.uses_default_secret() {
            log::warn!(
                "Signing tokens with the default JWT secret; set {} or jwt_secret in the config",
                JWT_SECRET_ENV
            );
        }
        let classifier: Arc<dyn Classifier> = if config.classifier_enabled {
            Arc::new(ColorClassifier::new())
        } else {
            log::info!("Classifier disabled, uploads will be '{}'", UNCLASSIFIED);
            Arc::new(DisabledClassifier)
        };
        let tokens = TokenIssuer::new(
            SecretString::new(config.jwt_secret.clone()),
            Duration::minutes(config.token_ttl_minutes),
        );
        Self::new(repo, classifier, tokens)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // ACCOUNTS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn register(&self, username: &str, password: &SecretString) -> VaultResult<UserOut> {
        self.auth.register(username, password)
    }

    pub fn login(&self, username: &str, password: &SecretString) -> VaultResult<AccessToken> {
        self.auth.login(username, password)
    }

    pub fn authenticate(&self, token: &str) -> VaultResult<AuthContext> {
        self.auth.authenticate(token)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PHOTO OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Encrypt and store an upload under `password`
    pub fn upload_photo(
        &self,
        ctx: &AuthContext,
        request: UploadRequest,
        password: &SecretString,
    ) -> VaultResult<PhotoSummary> {
        let subject = match request.subject_name.as_deref() {
            None | Some("") => None,
            Some(NO_SUBJECT) => {
                let label = label_or_fallback(self.classifier.as_ref(), &request.data);
                log::debug!("Classified upload '{}' as '{}'", request.filename, label);
                Some(self.subjects.resolve_or_create(&label, ctx.user_id)?)
            }
            Some(name) => Some(self.subjects.resolve_or_create(name, ctx.user_id)?),
        };

        let mime_type = request
            .mime_type
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| detect_mime(&request.data).to_string());

        let photo = Photo::create(
            NewPhoto {
                plaintext: &request.data,
                filename: &request.filename,
                mime_type: &mime_type,
                owner_id: ctx.user_id,
                subject_id: subject.as_ref().map(|s| s.id),
            },
            password,
        )?;
        self.repo.insert_photo(&photo)?;

        log::info!("Uploaded photo {} for {}", photo.id(), ctx.username);
        Ok(photo.summary(subject.map(|s| s.name)))
    }

    /// Decrypted current bytes and MIME type
    pub fn get_photo(&self, ctx: &AuthContext, id: PhotoId, password: &SecretString) -> VaultResult<(Vec<u8>, String)> {
        let photo = self.load_photo(ctx, id)?;
        let bytes = photo.read(password)?;
        Ok((bytes, photo.mime_type))
    }

    /// Metadata only; nothing is decrypted
    pub fn list_photos(&self, ctx: &AuthContext) -> VaultResult<Vec<PhotoSummary>> {
        let mut summaries = Vec::new();
        for photo in self.repo.list_photos_for_owner(ctx.user_id)? {
            let subject_name = self.subject_name(photo.subject_id, ctx.user_id)?;
            summaries.push(photo.summary(subject_name));
        }
        Ok(summaries)
    }

    pub fn duplicate_photo(&self, ctx: &AuthContext, id: PhotoId) -> VaultResult<PhotoSummary> {
        let source = self.load_photo(ctx, id)?;
        let copy = source.duplicate(ctx.user_id);
        self.repo.insert_photo(&copy)?;

        log::info!("Duplicated photo {} as {}", source.id(), copy.id());
        Ok(copy.summary(self.subject_name(copy.subject_id, ctx.user_id)?))
    }

    /// Re-tag a photo. An empty name clears the subject.
    ///
    /// Only the subject column is written; a filter landing at the same time
    /// keeps its envelope.
    pub fn update_photo_subject(&self, ctx: &AuthContext, id: PhotoId, subject_name: &str) -> VaultResult<PhotoSummary> {
        self.load_photo(ctx, id)?;

        let subject = if subject_name.is_empty() {
            None
        } else {
            Some(self.subjects.resolve_or_create(subject_name, ctx.user_id)?)
        };
        self.repo.set_subject(id, ctx.user_id, subject.as_ref().map(|s| s.id))?;

        log::debug!("Photo {} subject set to {:?}", id, subject.as_ref().map(|s| &s.name));
        let photo = self.load_photo(ctx, id)?;
        Ok(photo.summary(subject.map(|s| s.name)))
    }

    /// Apply a named filter, or `"none"` to restore the original
    pub fn apply_filter(
        &self,
        ctx: &AuthContext,
        id: PhotoId,
        filter_name: &str,
        password: &SecretString,
    ) -> VaultResult<PhotoSummary> {
        if !self.pipeline.accepts(filter_name) {
            return Err(VaultError::InvalidFilter(filter_name.to_string()));
        }

        let mut photo = self.load_photo(ctx, id)?;
        self.pipeline.apply(&mut photo, filter_name, password)?;
        self.repo
            .set_current(id, ctx.user_id, photo.current(), photo.filter_applied.as_deref())?;

        let photo = self.load_photo(ctx, id)?;
        Ok(photo.summary(self.subject_name(photo.subject_id, ctx.user_id)?))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // SUBJECTS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn list_subjects(&self, ctx: &AuthContext) -> VaultResult<Vec<Subject>> {
        self.subjects.list_for_owner(ctx.user_id)
    }

    pub fn create_subject(&self, ctx: &AuthContext, name: &str) -> VaultResult<Subject> {
        self.subjects.create(name, ctx.user_id)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // INTERNAL
    // ═══════════════════════════════════════════════════════════════════════

    fn load_photo(&self, ctx: &AuthContext, id: PhotoId) -> VaultResult<Photo> {
        self.repo
            .get_photo(id, ctx.user_id)?
            .ok_or(VaultError::NotFound("Photo"))
    }

    fn subject_name(&self, id: Option<SubjectId>, owner_id: UserId) -> VaultResult<Option<String>> {
        match id {
            Some(id) => Ok(self.repo.get_subject_by_id(id, owner_id)?.map(|s| s.name)),
            None => Ok(None),
        }
    }
}
