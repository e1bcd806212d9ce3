//! Gallery Vault - Subject Classifier
//!
//! Automatic labelling for uploads that ask for it. The classifier is built
//! once by the composition root and shared; nothing here is global.
//! Classification can never fail an upload: [`label_or_fallback`] turns every
//! error into [`UNCLASSIFIED`].

use image::imageops::FilterType;
use thiserror::Error;

/// Subject name an upload sends to request automatic classification
pub const NO_SUBJECT: &str = "noSubject";

/// Label used when classification fails
pub const UNCLASSIFIED: &str = "unclassified";

/// Classifier failure
#[derive(Error, Debug)]
pub enum ClassificationError {
    #[error("Image could not be decoded: {0}")]
    Decode(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Classifier unavailable")]
    Unavailable,
}

/// Image labelling capability
pub trait Classifier: Send + Sync {
    /// Return a single label for the encoded image
    fn classify(&self, image: &[u8]) -> Result<String, ClassificationError>;
}

/// Run the classifier, absorbing any failure.
pub fn label_or_fallback(classifier: &dyn Classifier, image: &[u8]) -> String {
    match classifier.classify(image) {
        Ok(label) if !label.trim().is_empty() => label,
        Ok(_) => {
            log::warn!("Classifier returned an empty label, using '{}'", UNCLASSIFIED);
            UNCLASSIFIED.to_string()
        }
        Err(e) => {
            log::warn!("Classification failed ({}), using '{}'", e, UNCLASSIFIED);
            UNCLASSIFIED.to_string()
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// IMPLEMENTATIONS
// ═══════════════════════════════════════════════════════════════════════════

/// Offline classifier that names the dominant colour of an image.
pub struct ColorClassifier {
    /// Side of the square the image is reduced to before sampling
    sample_size: u32,
}

impl Default for ColorClassifier {
    fn default() -> Self {
        Self { sample_size: 32 }
    }
}

impl ColorClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for ColorClassifier {
    fn classify(&self, image: &[u8]) -> Result<String, ClassificationError> {
        let img = image::load_from_memory(image)
            .map_err(|e| ClassificationError::Decode(e.to_string()))?;

        let small = img
            .resize_exact(self.sample_size, self.sample_size, FilterType::Triangle)
            .to_rgb8();

        let pixels = small.width() as u64 * small.height() as u64;
        if pixels == 0 {
            return Err(ClassificationError::Model("empty image".into()));
        }

        let (mut r, mut g, mut b) = (0u64, 0u64, 0u64);
        for p in small.pixels() {
            r += p[0] as u64;
            g += p[1] as u64;
            b += p[2] as u64;
        }

        Ok(color_name(
            (r / pixels) as u8,
            (g / pixels) as u8,
            (b / pixels) as u8,
        )
        .to_string())
    }
}

/// Classifier that always fails; uploads fall back to [`UNCLASSIFIED`]
pub struct DisabledClassifier;

impl Classifier for DisabledClassifier {
    fn classify(&self, _image: &[u8]) -> Result<String, ClassificationError> {
        Err(ClassificationError::Unavailable)
    }
}

/// Name an average colour by hue, or by brightness when it is nearly grey.
fn color_name(r: u8, g: u8, b: u8) -> &'static str {
    let (rf, gf, bf) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = rf.max(gf).max(bf);
    let min = rf.min(gf).min(bf);
    let delta = max - min;

    if delta < 0.12 {
        return match max {
            v if v > 0.85 => "white",
            v if v < 0.2 => "black",
            _ => "gray",
        };
    }

    let hue = if max == rf {
        60.0 * (((gf - bf) / delta).rem_euclid(6.0))
    } else if max == gf {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };

    match hue {
        h if !(20.0..340.0).contains(&h) => "red",
        h if h < 45.0 => "orange",
        h if h < 70.0 => "yellow",
        h if h < 165.0 => "green",
        h if h < 200.0 => "cyan",
        h if h < 260.0 => "blue",
        h if h < 300.0 => "purple",
        _ => "pink",
    }
}
