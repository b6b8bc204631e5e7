//! Edit request payloads for the external image-generation gateway.
//!
//! The gateway's schema is not ours; this is the artifact we hand over:
//! a prompt, the source image and the mask, both as data URIs.

use crate::error::Result;
use crate::geometry::SelectionRegion;
use crate::image_processing::ImageProcessor;
use crate::loader::{load_image, ImageSource};
use crate::mask::synthesize_mask;
use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Source image, mask and instruction for an inpainting-style edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub prompt: String,
    /// Source image as a data URI.
    pub image: String,
    /// Mask as a PNG data URI; white marks the editable area.
    pub mask: String,
    /// The selection the mask was synthesized from, for replay.
    pub region: SelectionRegion,
    pub mask_width: u32,
    pub mask_height: u32,
}

/// How the mask resolution is chosen for an [`EditRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskSize {
    /// A fixed output size, e.g. 1024x576.
    Fixed(u32, u32),
    /// Match the decoded source image.
    MatchSource,
}

impl EditRequest {
    /// Loads the source, synthesizes the mask and bundles both.
    ///
    /// The source is re-encoded as PNG so the gateway always receives a
    /// format it can decode regardless of what was uploaded.
    pub async fn build(
        source: &ImageSource,
        region: &SelectionRegion,
        prompt: impl Into<String>,
        mask_size: MaskSize,
        timeout: Duration,
    ) -> Result<Self> {
        let image = load_image(source, timeout).await?;
        let (mask_width, mask_height) = match mask_size {
            MaskSize::Fixed(w, h) => (w, h),
            MaskSize::MatchSource => (image.width(), image.height()),
        };

        let mask = synthesize_mask(region, mask_width, mask_height)?;
        let encoded = ImageProcessor::encode(&image, ImageFormat::Png)?;

        Ok(Self {
            prompt: prompt.into(),
            image: encoded.to_data_uri(),
            mask: mask.to_data_uri(),
            region: region.clamped()?,
            mask_width,
            mask_height,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use image::{DynamicImage, Rgba, RgbaImage};

    fn source(width: u32, height: u32) -> ImageSource {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([5, 6, 7, 255])));
        ImageSource::Bytes(ImageProcessor::encode(&image, ImageFormat::Png).unwrap().bytes)
    }

    #[tokio::test]
    async fn bundles_image_and_mask_as_data_uris() {
        let region = SelectionRegion::new(25.0, 25.0, 50.0, 50.0);
        let request = EditRequest::build(
            &source(64, 32),
            &region,
            "replace the sofa with a leather armchair",
            MaskSize::Fixed(1024, 576),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(request.image.starts_with("data:image/png;base64,"));
        assert!(request.mask.starts_with("data:image/png;base64,"));
        assert_eq!((request.mask_width, request.mask_height), (1024, 576));

        let (_, mask_bytes) = ImageProcessor::parse_data_uri(&request.mask).unwrap();
        let mask = image::load_from_memory(&mask_bytes).unwrap().to_rgba8();
        assert_eq!(mask.get_pixel(512, 288), &Rgba([255, 255, 255, 255]));
    }

    #[tokio::test]
    async fn mask_can_match_source_resolution() {
        let request = EditRequest::build(
            &source(40, 30),
            &SelectionRegion::FULL,
            "",
            MaskSize::MatchSource,
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        assert_eq!((request.mask_width, request.mask_height), (40, 30));
    }

    #[tokio::test]
    async fn serializes_with_camel_case_keys() {
        let request = EditRequest::build(
            &source(8, 8),
            &SelectionRegion::new(90.0, 0.0, 30.0, 10.0),
            "paint it",
            MaskSize::Fixed(16, 16),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        let json: serde_json::Value = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(json["maskWidth"], 16);
        assert_eq!(json["prompt"], "paint it");
        assert_eq!(json["region"]["width"], 10.0);
    }

    #[tokio::test]
    async fn load_failures_propagate() {
        let err = EditRequest::build(
            &ImageSource::Bytes(Vec::new()),
            &SelectionRegion::FULL,
            "x",
            MaskSize::MatchSource,
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ImageLoad(_)));
    }
}
