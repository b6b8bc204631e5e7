//! Awaitable image loading with an explicit timeout.
//!
//! Reading happens on `tokio::fs`, decoding on the blocking pool. The whole
//! load runs under `tokio::time::timeout`, so a source that never resolves
//! fails with [`AppError::ImageLoadTimeout`] instead of hanging the caller.
//! Dropping the returned future cancels the load.
//!
//! A timed-out read that is stuck in a blocking syscall (a FIFO with no
//! writer, a hung network mount) keeps its blocking-pool thread until the
//! syscall returns, and dropping a tokio runtime waits for those threads.
//! Binaries should shut their runtime down with
//! [`Runtime::shutdown_timeout`](tokio::runtime::Runtime::shutdown_timeout)
//! so an abandoned read cannot keep the process alive.

use crate::error::{AppError, Result};
use crate::image_processing::ImageProcessor;
use image::DynamicImage;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a source image comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Already-fetched encoded bytes.
    Bytes(Vec<u8>),
    /// A file on disk.
    Path(PathBuf),
    /// A base64 `data:` URI.
    DataUri(String),
}

impl ImageSource {
    /// Interprets a command-line style argument: `data:` URIs as such,
    /// anything else as a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg.starts_with("data:") {
            Self::DataUri(arg.to_string())
        } else {
            Self::Path(PathBuf::from(arg))
        }
    }

    /// Reads the encoded bytes.
    pub async fn read(&self) -> Result<Vec<u8>> {
        match self {
            Self::Bytes(bytes) => Ok(bytes.clone()),
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| AppError::image_load(format!("{}: {}", path.display(), e))),
            Self::DataUri(uri) => ImageProcessor::parse_data_uri(uri).map(|(_, bytes)| bytes),
        }
    }
}

/// Loads and decodes `source`, failing if it takes longer than `timeout`.
///
/// # Errors
///
/// - [`AppError::ImageLoad`] if the source cannot be read or decoded
/// - [`AppError::ImageLoadTimeout`] if `timeout` elapses first
pub async fn load_image(source: &ImageSource, timeout: Duration) -> Result<DynamicImage> {
    load_with_timeout(source.read(), timeout).await
}

/// Decodes whatever bytes `fetch` resolves to, bounded by `timeout`.
///
/// This is the seam for sources this crate does not know how to fetch
/// (e.g. an HTTP body): the caller supplies the byte future.
pub async fn load_with_timeout<F>(fetch: F, timeout: Duration) -> Result<DynamicImage>
where
    F: Future<Output = Result<Vec<u8>>>,
{
    let load = async {
        let bytes = fetch.await?;
        decode(bytes).await
    };

    let result = match tokio::time::timeout(timeout, load).await {
        Ok(result) => result,
        Err(_) => Err(AppError::ImageLoadTimeout(timeout)),
    };

    match &result {
        Ok(image) => debug!(width = image.width(), height = image.height(), "decoded source image"),
        Err(e) => warn!(error = %e, "source image failed to load"),
    }
    result
}

/// Loads the image and reports only its pixel dimensions.
pub async fn probe_dimensions(source: &ImageSource, timeout: Duration) -> Result<(u32, u32)> {
    let image = load_image(source, timeout).await?;
    Ok((image.width(), image.height()))
}

async fn decode(bytes: Vec<u8>) -> Result<DynamicImage> {
    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
        .await
        .map_err(|e| AppError::image_load(format!("Decode task failed: {}", e)))?
        .map_err(|e| AppError::image_load(format!("Failed to decode image: {}", e)))
}
