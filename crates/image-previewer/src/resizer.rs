//! Decode, resize and re-encode images

use crate::error::ResizeError;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;

/// Resizes images to exact dimensions and encodes them as JPEG
#[derive(Debug, Clone, Copy)]
pub struct Resizer {
    quality: u8,
}

impl Resizer {
    pub fn new(quality: u8) -> Self {
        Self { quality }
    }

    /// Resize `data` (any supported format) to exactly `width` x `height`.
    ///
    /// CPU bound; call from a blocking context.
    pub fn resize(&self, data: &[u8], width: u32, height: u32) -> Result<Vec<u8>, ResizeError> {
        if width == 0 || height == 0 {
            return Err(ResizeError::InvalidDimensions(width, height));
        }

        let source = image::load_from_memory(data).map_err(ResizeError::Decode)?;
        let resized = source
            .resize_exact(width, height, FilterType::Lanczos3)
            .to_rgb8();

        let mut out = Vec::new();
        JpegEncoder::new_with_quality(&mut out, self.quality)
            .encode_image(&resized)
            .map_err(ResizeError::Encode)?;

        Ok(out)
    }
}

impl Default for Resizer {
    fn default() -> Self {
        Self::new(70)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_png;
    use image::{DynamicImage, GenericImageView, ImageFormat, RgbaImage};
    use std::io::Cursor;

    #[test]
    fn test_resize_png_to_jpeg() {
        let resized = Resizer::default().resize(&sample_png(64, 48), 20, 10).unwrap();

        assert_eq!(image::guess_format(&resized).unwrap(), ImageFormat::Jpeg);
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!(decoded.dimensions(), (20, 10));
    }

    #[test]
    fn test_resize_upscales() {
        let resized = Resizer::default().resize(&sample_png(8, 8), 100, 100).unwrap();
        let decoded = image::load_from_memory(&resized).unwrap();
        assert_eq!(decoded.dimensions(), (100, 100));
    }

    #[test]
    fn test_resize_drops_alpha() {
        let rgba = RgbaImage::from_pixel(16, 16, image::Rgba([10, 20, 30, 128]));
        let mut png = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let resized = Resizer::default().resize(&png, 4, 4).unwrap();
        assert_eq!(image::load_from_memory(&resized).unwrap().dimensions(), (4, 4));
    }

    #[test]
    fn test_higher_quality_is_larger() {
        let png = sample_png(64, 64);
        let low = Resizer::new(10).resize(&png, 64, 64).unwrap();
        let high = Resizer::new(100).resize(&png, 64, 64).unwrap();
        assert!(high.len() > low.len());
    }

    #[test]
    fn test_unknown_format() {
        let err = Resizer::default().resize(b"definitely not an image", 10, 10).unwrap_err();
        assert!(matches!(err, ResizeError::Decode(_)));
    }

    #[test]
    fn test_zero_dimension() {
        let err = Resizer::default().resize(&sample_png(8, 8), 0, 10).unwrap_err();
        assert!(matches!(err, ResizeError::InvalidDimensions(0, 10)));
    }
}
