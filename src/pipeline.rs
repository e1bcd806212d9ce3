//! Gallery Vault - Filter Pipeline
//!
//! A photo is either unfiltered (`current == original`) or filtered by one
//! name, with `current` derived from `original`. Every filter run starts
//! from `original`, so applying the same filter twice gives the same pixels
//! as applying it once. `"none"` copies `original` back over `current`
//! without touching the cipher.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, ImageReader};
use secrecy::SecretString;

use crate::crypto::EncryptedBlob;
use crate::error::{VaultError, VaultResult};
use crate::filters::{Filter, RESTORE};
use crate::store::Photo;

/// Format used when the source format has no encoder
pub const FALLBACK_FORMAT: ImageFormat = ImageFormat::Jpeg;

/// Decrypt → transform → re-encrypt
pub struct FilterPipeline<F: Filter> {
    filter: F,
}

impl<F: Filter> FilterPipeline<F> {
    pub fn new(filter: F) -> Self {
        Self { filter }
    }

    /// Whether `name` is accepted by [`apply`](Self::apply)
    pub fn accepts(&self, name: &str) -> bool {
        name == RESTORE || self.filter.supports(name)
    }

    /// Apply `filter_name` to `photo` in place.
    ///
    /// The photo is untouched on any error.
    pub fn apply(&self, photo: &mut Photo, filter_name: &str, password: &SecretString) -> VaultResult<()> {
        if filter_name == RESTORE {
            photo.restore_original();
            log::debug!("Photo {} restored to original", photo.id());
            return Ok(());
        }

        if !self.filter.supports(filter_name) {
            return Err(VaultError::InvalidFilter(filter_name.to_string()));
        }

        let plaintext = photo.original().open(password)?;
        let (image, format) = decode(&plaintext)?;

        let filtered = self
            .filter
            .apply(filter_name, DynamicImage::ImageRgb8(image.to_rgb8()))
            .map_err(|e| VaultError::InvalidFilter(e.0))?;

        let encoded = encode(&filtered, format)?;
        let blob = EncryptedBlob::seal(&encoded, password)?;
        photo.replace_current(blob, filter_name);

        log::debug!("Applied '{}' to photo {}", filter_name, photo.id());
        Ok(())
    }
}

fn decode(bytes: &[u8]) -> VaultResult<(DynamicImage, Option<ImageFormat>)> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| VaultError::InvalidImage(e.to_string()))?;
    let format = reader.format();
    let image = reader
        .decode()
        .map_err(|e| VaultError::InvalidImage(e.to_string()))?;
    Ok((image, format))
}

/// Encode in the source format, or [`FALLBACK_FORMAT`] if that fails.
fn encode(image: &DynamicImage, format: Option<ImageFormat>) -> VaultResult<Vec<u8>> {
    if let Some(format) = format.filter(|f| *f != FALLBACK_FORMAT) {
        let mut out = Vec::new();
        match image.write_to(&mut Cursor::new(&mut out), format) {
            Ok(()) => return Ok(out),
            Err(e) => log::debug!("No {:?} encoder ({}), using {:?}", format, e, FALLBACK_FORMAT),
        }
    }

    let mut out = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut out), FALLBACK_FORMAT)
        .map_err(|e| VaultError::ImageEncoding(e.to_string()))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::{StandardFilters, COLOR_INVERSION, SEPIA};
    use crate::store::NewPhoto;
    use image::{Rgb, RgbImage};
    use uuid::Uuid;

    fn pw(s: &str) -> SecretString {
        SecretString::new(s.to_string())
    }

    fn png() -> Vec<u8> {
        let img = RgbImage::from_fn(8, 8, |x, y| Rgb([(x * 30) as u8, (y * 30) as u8, 200]));
        let mut out = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    fn photo(bytes: &[u8]) -> Photo {
        Photo::create(
            NewPhoto {
                plaintext: bytes,
                filename: "square.png",
                mime_type: "image/png",
                owner_id: Uuid::new_v4(),
                subject_id: None,
            },
            &pw("pw1"),
        )
        .unwrap()
    }

    fn pipeline() -> FilterPipeline<StandardFilters> {
        FilterPipeline::new(StandardFilters)
    }

    #[test]
    fn test_filter_starts_from_original() {
        let mut p = photo(&png());
        let pipeline = pipeline();

        pipeline.apply(&mut p, SEPIA, &pw("pw1")).unwrap();
        let once_blob = p.current().clone();
        let once = p.read(&pw("pw1")).unwrap();

        pipeline.apply(&mut p, SEPIA, &pw("pw1")).unwrap();
        let twice = p.read(&pw("pw1")).unwrap();

        assert_eq!(p.filter_applied.as_deref(), Some(SEPIA));
        assert_eq!(once, twice);
        assert_ne!(&once_blob, p.current());
        assert_ne!(p.current().salt(), p.original().salt());
        assert_eq!(&twice[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_restore_after_filters() {
        let source = png();
        let mut p = photo(&source);
        let pipeline = pipeline();

        pipeline.apply(&mut p, SEPIA, &pw("pw1")).unwrap();
        pipeline.apply(&mut p, COLOR_INVERSION, &pw("pw1")).unwrap();
        assert_ne!(p.read(&pw("pw1")).unwrap(), source);

        pipeline.apply(&mut p, RESTORE, &pw("pw1")).unwrap();
        assert_eq!(p.filter_applied, None);
        assert_eq!(p.current(), p.original());
        assert_eq!(p.read(&pw("pw1")).unwrap(), source);
    }

    #[test]
    fn test_restore_needs_no_valid_password() {
        let mut p = photo(&png());
        pipeline().apply(&mut p, RESTORE, &pw("anything")).unwrap();
        assert_eq!(p.filter_applied, None);
    }

    #[test]
    fn test_wrong_password_leaves_photo_unchanged() {
        let mut p = photo(&png());
        let before = p.current().clone();

        let result = pipeline().apply(&mut p, SEPIA, &pw("nope"));
        assert!(matches!(result, Err(VaultError::DecryptionFailed)));
        assert_eq!(p.current(), &before);
        assert_eq!(p.filter_applied, None);
    }

    #[test]
    fn test_unknown_filter_leaves_photo_unchanged() {
        let mut p = photo(&png());
        let before = p.current().clone();

        let result = pipeline().apply(&mut p, "blur", &pw("pw1"));
        assert!(matches!(result, Err(VaultError::InvalidFilter(name)) if name == "blur"));
        assert_eq!(p.current(), &before);
        assert!(!pipeline().accepts("blur"));
        assert!(pipeline().accepts(RESTORE));
    }

    #[test]
    fn test_non_image_is_invalid_image() {
        let mut p = photo(b"redsquare");
        let result = pipeline().apply(&mut p, SEPIA, &pw("pw1"));
        assert!(matches!(result, Err(VaultError::InvalidImage(_))));
        assert_eq!(p.filter_applied, None);
    }

    #[test]
    fn test_jpeg_source_stays_jpeg() {
        let mut jpeg = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([10, 120, 240])))
            .write_to(&mut Cursor::new(&mut jpeg), ImageFormat::Jpeg)
            .unwrap();

        let mut p = photo(&jpeg);
        pipeline().apply(&mut p, COLOR_INVERSION, &pw("pw1")).unwrap();
        let out = p.read(&pw("pw1")).unwrap();
        assert_eq!(&out[..3], &[0xFF, 0xD8, 0xFF]);
    }
}
