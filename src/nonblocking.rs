//! Gallery Vault - Async Facade
//!
//! Key derivation and image transforms are CPU-bound. Each call here moves
//! one [`GalleryApi`] operation onto tokio's blocking pool so async callers
//! never stall their executor.

use std::sync::Arc;

use secrecy::SecretString;

use crate::api::{GalleryApi, UploadRequest};
use crate::auth::AuthContext;
use crate::error::{VaultError, VaultResult};
use crate::models::{AccessToken, PhotoId, PhotoSummary, Subject, UserOut};

/// Cloneable async handle to a shared [`GalleryApi`]
#[derive(Clone)]
pub struct AsyncGallery {
    inner: Arc<GalleryApi>,
}

impl AsyncGallery {
    pub fn new(api: Arc<GalleryApi>) -> Self {
        Self { inner: api }
    }

    async fn run<T, F>(&self, op: F) -> VaultResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&GalleryApi) -> VaultResult<T> + Send + 'static,
    {
        let api = self.inner.clone();
        tokio::task::spawn_blocking(move || op(api.as_ref()))
            .await
            .map_err(|e| VaultError::Internal(format!("blocking task failed: {}", e)))?
    }

    pub async fn register(&self, username: String, password: SecretString) -> VaultResult<UserOut> {
        self.run(move |api| api.register(&username, &password)).await
    }

    pub async fn login(&self, username: String, password: SecretString) -> VaultResult<AccessToken> {
        self.run(move |api| api.login(&username, &password)).await
    }

    pub async fn authenticate(&self, token: String) -> VaultResult<AuthContext> {
        self.run(move |api| api.authenticate(&token)).await
    }

    pub async fn upload_photo(
        &self,
        ctx: AuthContext,
        request: UploadRequest,
        password: SecretString,
    ) -> VaultResult<PhotoSummary> {
        self.run(move |api| api.upload_photo(&ctx, request, &password)).await
    }

    pub async fn get_photo(
        &self,
        ctx: AuthContext,
        id: PhotoId,
        password: SecretString,
    ) -> VaultResult<(Vec<u8>, String)> {
        self.run(move |api| api.get_photo(&ctx, id, &password)).await
    }

    pub async fn list_photos(&self, ctx: AuthContext) -> VaultResult<Vec<PhotoSummary>> {
        self.run(move |api| api.list_photos(&ctx)).await
    }

    pub async fn duplicate_photo(&self, ctx: AuthContext, id: PhotoId) -> VaultResult<PhotoSummary> {
        self.run(move |api| api.duplicate_photo(&ctx, id)).await
    }

    pub async fn update_photo_subject(
        &self,
        ctx: AuthContext,
        id: PhotoId,
        subject_name: String,
    ) -> VaultResult<PhotoSummary> {
        self.run(move |api| api.update_photo_subject(&ctx, id, &subject_name)).await
    }

    pub async fn apply_filter(
        &self,
        ctx: AuthContext,
        id: PhotoId,
        filter_name: String,
        password: SecretString,
    ) -> VaultResult<PhotoSummary> {
        self.run(move |api| api.apply_filter(&ctx, id, &filter_name, &password)).await
    }

    pub async fn list_subjects(&self, ctx: AuthContext) -> VaultResult<Vec<Subject>> {
        self.run(move |api| api.list_subjects(&ctx)).await
    }

    pub async fn create_subject(&self, ctx: AuthContext, name: String) -> VaultResult<Subject> {
        self.run(move |api| api.create_subject(&ctx, &name)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::classifier::ColorClassifier;
    use crate::filters::SEPIA;
    use crate::repository::MemoryRepository;
    use chrono::Duration;
    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;

    fn secret(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn gallery() -> AsyncGallery {
        AsyncGallery::new(Arc::new(GalleryApi::new(
            Arc::new(MemoryRepository::new()),
            Arc::new(ColorClassifier::new()),
            TokenIssuer::new(secret("test-secret"), Duration::minutes(30)),
        )))
    }

    fn png() -> Vec<u8> {
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([30, 40, 220])))
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    #[tokio::test]
    async fn test_async_flow() {
        let gallery = gallery();
        gallery.register("alice".into(), secret("login")).await.unwrap();
        let token = gallery.login("alice".into(), secret("login")).await.unwrap();
        let ctx = gallery.authenticate(token.access_token).await.unwrap();

        let photo = gallery
            .upload_photo(
                ctx.clone(),
                UploadRequest {
                    filename: "sky.png".into(),
                    mime_type: None,
                    data: png(),
                    subject_name: Some("noSubject".into()),
                },
                secret("pw1"),
            )
            .await
            .unwrap();
        assert_eq!(photo.subject_name.as_deref(), Some("blue"));

        let filtered = gallery
            .apply_filter(ctx.clone(), photo.id, SEPIA.into(), secret("pw1"))
            .await
            .unwrap();
        assert_eq!(filtered.filter_applied.as_deref(), Some(SEPIA));

        let err = gallery
            .get_photo(ctx.clone(), photo.id, secret("wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, VaultError::DecryptionFailed));
        assert_eq!(gallery.list_photos(ctx).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_subject_creation_yields_one_row() {
        let gallery = gallery();
        gallery.register("alice".into(), secret("login")).await.unwrap();
        let token = gallery.login("alice".into(), secret("login")).await.unwrap();
        let ctx = gallery.authenticate(token.access_token).await.unwrap();
        let photo = gallery
            .upload_photo(
                ctx.clone(),
                UploadRequest {
                    filename: "sky.png".into(),
                    mime_type: None,
                    data: png(),
                    subject_name: None,
                },
                secret("pw1"),
            )
            .await
            .unwrap();

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let gallery = gallery.clone();
            let ctx = ctx.clone();
            tasks.push(tokio::spawn(async move {
                gallery.update_photo_subject(ctx, photo.id, "Vacation".into()).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(gallery.list_subjects(ctx).await.unwrap().len(), 1);
    }
}
