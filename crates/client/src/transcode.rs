//! Cover transcoding: bounded-width resize and progressive JPEG encoding.

use image::DynamicImage;
use image::imageops::FilterType;
use lectio_core::AppConfig;

/// Errors from cover transcoding.
#[derive(Debug, thiserror::Error)]
pub enum TranscodeError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("failed to encode JPEG: {0}")]
    Encode(String),

    #[error("image dimensions {width}x{height} exceed encoder limits")]
    Dimensions { width: u32, height: u32 },
}

/// Resizes covers to a maximum width and re-encodes them as progressive JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transcoder {
    /// Maximum output width in pixels. Narrower images are never upscaled.
    pub max_width: u32,
    /// JPEG quality, 1-100.
    pub quality: u8,
}

impl Default for Transcoder {
    fn default() -> Self {
        Self { max_width: 400, quality: 80 }
    }
}

impl From<&AppConfig> for Transcoder {
    fn from(config: &AppConfig) -> Self {
        Self { max_width: config.cover_width, quality: config.cover_quality }
    }
}

impl Transcoder {
    /// Output dimensions for a source image, preserving aspect ratio.
    pub fn target_dimensions(&self, width: u32, height: u32) -> (u32, u32) {
        if width <= self.max_width {
            return (width, height);
        }
        let scaled = (f64::from(height) * f64::from(self.max_width) / f64::from(width)).round();
        (self.max_width, (scaled as u32).max(1))
    }

    /// Decode `bytes`, shrink to `max_width` if wider, and encode as progressive JPEG.
    pub fn transcode(&self, bytes: &[u8]) -> Result<Vec<u8>, TranscodeError> {
        let img = image::load_from_memory(bytes)?;
        let (width, height) = self.target_dimensions(img.width(), img.height());

        let img = if (width, height) == (img.width(), img.height()) {
            img
        } else {
            img.resize_exact(width, height, FilterType::Lanczos3)
        };

        encode_progressive(&img, self.quality)
    }
}

fn encode_progressive(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, TranscodeError> {
    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    let too_large = || TranscodeError::Dimensions { width, height };
    let w = u16::try_from(width).map_err(|_| too_large())?;
    let h = u16::try_from(height).map_err(|_| too_large())?;

    let mut out = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut out, quality);
    encoder.set_progressive(true);
    encoder
        .encode(rgb.as_raw(), w, h, jpeg_encoder::ColorType::Rgb)
        .map_err(|e| TranscodeError::Encode(e.to_string()))?;

    Ok(out)
}
