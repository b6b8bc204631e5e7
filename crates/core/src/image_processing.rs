//! Image encoding utilities.
//!
//! Masks and previews leave this crate as encoded rasters, usually embedded
//! in a JSON payload as a `data:` URI. This module owns the conversions
//! between pixel buffers, encoded bytes, base64 and data URIs.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;

/// An encoded raster image together with its pixel dimensions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl RasterImage {
    /// MIME type of the encoded bytes, e.g. `image/png`.
    pub fn mime_type(&self) -> &'static str {
        self.format.to_mime_type()
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Embeds the image as `data:<mime>;base64,<payload>`.
    pub fn to_data_uri(&self) -> String {
        ImageProcessor::data_uri(self.mime_type(), &self.bytes)
    }

    /// Decodes the bytes back into pixels.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if the bytes are not a valid
    /// image of the recorded format.
    pub fn decode(&self) -> Result<DynamicImage> {
        image::load_from_memory_with_format(&self.bytes, self.format)
            .map_err(|e| AppError::image(format!("Failed to decode raster: {}", e)))
    }
}

/// Image processing utilities shared by the mask and preview pipelines.
pub struct ImageProcessor;

impl ImageProcessor {
    /// Encodes an image in the given format.
    ///
    /// JPEG has no alpha channel, so RGBA input is flattened to RGB first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageProcessing`] if encoding fails.
    pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<RasterImage> {
        let mut buffer: Vec<u8> = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        let written = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format),
            _ => image.write_to(&mut cursor, format),
        };
        written.map_err(|e| AppError::image(format!("Failed to encode image: {}", e)))?;

        Ok(RasterImage {
            width: image.width(),
            height: image.height(),
            format,
            bytes: buffer,
        })
    }

    /// Builds a base64 `data:` URI.
    pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime_type, BASE64.encode(bytes))
    }

    /// Splits a base64 `data:` URI into its MIME type and decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::ImageLoad`] if the URI is not a base64 data URI
    /// or the payload is not valid base64.
    pub fn parse_data_uri(uri: &str) -> Result<(String, Vec<u8>)> {
        let rest = uri
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| AppError::image_load("not a data URI"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::image_load("data URI has no payload"))?;

        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::image_load("only base64 data URIs are supported"))?;

        let bytes = BASE64
            .decode(payload)
            .map_err(|e| AppError::image_load(format!("Invalid base64 payload: {}", e)))?;

        Ok((mime_type.to_string(), bytes))
    }

    /// Scales `(width, height)` down so the longer side is at most `max_side`,
    /// preserving aspect ratio. Never upscales; each side stays at least 1.
    pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
        let longer = width.max(height);
        if longer == 0 || longer <= max_side {
            return (width.max(1), height.max(1));
        }

        let scale = max_side as f64 / longer as f64;
        let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_side);
        (scaled(width), scaled(height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([10, 20, 30, 255])))
    }

    #[test]
    fn png_encode_decodes_to_same_pixels() {
        let raster = ImageProcessor::encode(&sample(), ImageFormat::Png).unwrap();
        assert_eq!((raster.width, raster.height), (4, 3));
        assert_eq!(raster.mime_type(), "image/png");

        let decoded = raster.decode().unwrap().to_rgba8();
        assert_eq!(decoded.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn jpeg_encoding_accepts_rgba_input() {
        let raster = ImageProcessor::encode(&sample(), ImageFormat::Jpeg).unwrap();
        assert_eq!(raster.mime_type(), "image/jpeg");
        assert!(raster.bytes.starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn data_uri_parses_back() {
        let raster = ImageProcessor::encode(&sample(), ImageFormat::Png).unwrap();
        let uri = raster.to_data_uri();
        assert!(uri.starts_with("data:image/png;base64,"));

        let (mime, bytes) = ImageProcessor::parse_data_uri(&uri).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(bytes, raster.bytes);
    }

    #[test]
    fn malformed_data_uris_are_load_errors() {
        for uri in [
            "https://example.com/a.png",
            "data:image/png;base64",
            "data:image/png,plain",
            "data:image/png;base64,***",
        ] {
            let err = ImageProcessor::parse_data_uri(uri).unwrap_err();
            assert!(err.is_image_load(), "{} gave {:?}", uri, err);
        }
    }

    #[test]
    fn fit_within_bounds_longer_side() {
        assert_eq!(ImageProcessor::fit_within(1600, 900, 200), (200, 113));
        assert_eq!(ImageProcessor::fit_within(900, 1600, 200), (113, 200));
        assert_eq!(ImageProcessor::fit_within(100, 50, 200), (100, 50));
        assert_eq!(ImageProcessor::fit_within(10000, 1, 200), (200, 1));
    }
}
