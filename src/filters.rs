//! Gallery Vault - Pixel Filters
//!
//! Pure transforms over decoded images. Nothing here knows about envelopes
//! or passwords; the [`FilterPipeline`](crate::pipeline::FilterPipeline)
//! decrypts, calls a [`Filter`], and re-seals.

use image::{DynamicImage, Rgb, RgbImage};
use thiserror::Error;

/// Name that restores the original instead of transforming
pub const RESTORE: &str = "none";

pub const SEPIA: &str = "sepia";
pub const BLACK_AND_WHITE: &str = "black and white";
pub const COLOR_INVERSION: &str = "color inversion";

/// Names handled by [`StandardFilters`]
pub const STANDARD_FILTERS: [&str; 3] = [SEPIA, BLACK_AND_WHITE, COLOR_INVERSION];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unsupported filter: {0}")]
pub struct UnsupportedFilter(pub String);

/// Named image transform
pub trait Filter: Send + Sync {
    fn supports(&self, name: &str) -> bool;

    fn apply(&self, name: &str, image: DynamicImage) -> Result<DynamicImage, UnsupportedFilter>;
}

/// Sepia, greyscale and inversion
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardFilters;

impl Filter for StandardFilters {
    fn supports(&self, name: &str) -> bool {
        STANDARD_FILTERS.contains(&name)
    }

    fn apply(&self, name: &str, image: DynamicImage) -> Result<DynamicImage, UnsupportedFilter> {
        match name {
            SEPIA => Ok(DynamicImage::ImageRgb8(sepia(&image.to_rgb8()))),
            BLACK_AND_WHITE => Ok(DynamicImage::ImageRgb8(black_and_white(&image.to_rgb8()))),
            COLOR_INVERSION => {
                let mut rgb = image.to_rgb8();
                image::imageops::invert(&mut rgb);
                Ok(DynamicImage::ImageRgb8(rgb))
            }
            other => Err(UnsupportedFilter(other.to_string())),
        }
    }
}

/// Classic sepia tone matrix; channels are clamped at 255 and truncated.
fn sepia(src: &RgbImage) -> RgbImage {
    const M: [[f32; 3]; 3] = [
        [0.393, 0.769, 0.189],
        [0.349, 0.686, 0.168],
        [0.272, 0.534, 0.131],
    ];

    let mut out = src.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = px.0.map(f32::from);
        let tone = |row: [f32; 3]| (row[0] * r + row[1] * g + row[2] * b).min(255.0) as u8;
        *px = Rgb([tone(M[0]), tone(M[1]), tone(M[2])]);
    }
    out
}

/// ITU-R 601-2 luma, `L = R * 299/1000 + G * 587/1000 + B * 114/1000`,
/// truncated and copied to all three channels.
fn black_and_white(src: &RgbImage) -> RgbImage {
    let mut out = src.clone();
    for px in out.pixels_mut() {
        let [r, g, b] = px.0.map(u32::from);
        let l = ((r * 299 + g * 587 + b * 114) / 1000) as u8;
        *px = Rgb([l, l, l]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(color: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb(color)))
    }

    fn first_pixel(img: &DynamicImage) -> [u8; 3] {
        img.to_rgb8().get_pixel(0, 0).0
    }

    #[test]
    fn test_supports_known_names_only() {
        let f = StandardFilters;
        for name in STANDARD_FILTERS {
            assert!(f.supports(name));
        }
        assert!(!f.supports(RESTORE));
        assert!(!f.supports("blur"));
        assert!(!f.supports("Sepia"));
    }

    #[test]
    fn test_sepia_matrix() {
        let out = StandardFilters.apply(SEPIA, solid([100, 50, 20])).unwrap();
        // r = 39.3 + 38.45 + 3.78, g = 34.9 + 34.3 + 3.36, b = 27.2 + 26.7 + 2.62
        assert_eq!(first_pixel(&out), [81, 72, 56]);

        let white = StandardFilters.apply(SEPIA, solid([255, 255, 255])).unwrap();
        assert_eq!(first_pixel(&white), [255, 255, 238]);
    }

    #[test]
    fn test_black_and_white_is_grey_rgb() {
        let out = StandardFilters.apply(BLACK_AND_WHITE, solid([200, 30, 90])).unwrap();
        let [r, g, b] = first_pixel(&out);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert!(matches!(out, DynamicImage::ImageRgb8(_)));
    }

    #[test]
    fn test_black_and_white_uses_601_luma() {
        // 59.8 + 17.61 + 10.26; Rec.709 weights would give 70
        let out = StandardFilters.apply(BLACK_AND_WHITE, solid([200, 30, 90])).unwrap();
        assert_eq!(first_pixel(&out), [87, 87, 87]);

        let green = StandardFilters.apply(BLACK_AND_WHITE, solid([0, 255, 0])).unwrap();
        assert_eq!(first_pixel(&green), [149, 149, 149]);

        let white = StandardFilters.apply(BLACK_AND_WHITE, solid([255, 255, 255])).unwrap();
        assert_eq!(first_pixel(&white), [255, 255, 255]);
    }

    #[test]
    fn test_color_inversion() {
        let out = StandardFilters.apply(COLOR_INVERSION, solid([200, 30, 90])).unwrap();
        assert_eq!(first_pixel(&out), [55, 225, 165]);
    }

    #[test]
    fn test_unknown_filter() {
        let err = StandardFilters.apply("blur", solid([0, 0, 0])).unwrap_err();
        assert_eq!(err, UnsupportedFilter("blur".into()));
    }
}
