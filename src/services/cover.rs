//! Cover art retrieval
//!
//! Downloads cover images, re-encodes them to baseline JPEG, and memoizes the
//! encoded bytes per source URL so one album's songs share a single download.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::ImageFormat;
use thiserror::Error;

use crate::cache::CoverCache;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("Cover download failed: {0}")]
    Network(String),

    #[error("Cover image could not be decoded: {0}")]
    Decode(String),
}

/// Fetches and re-encodes cover art, backed by a [`CoverCache`].
pub struct CoverFetcher {
    http_client: reqwest::Client,
    cache: Arc<CoverCache>,
}

impl CoverFetcher {
    pub fn new(cache: Arc<CoverCache>) -> Result<Self, CoverError> {
        let http_client = reqwest::Client::builder()
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| CoverError::Network(e.to_string()))?;

        Ok(Self { http_client, cache })
    }

    /// Fetch the cover at `url` as JPEG bytes. `Ok(None)` means the URL
    /// yielded nothing usable (non-success status or an empty body).
    pub async fn fetch(&self, url: &str) -> Result<Option<Vec<u8>>, CoverError> {
        if let Some(cached) = self.cache.get(url).await {
            return Ok(Some(cached));
        }

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| CoverError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %url, status = status.as_u16(), "Cover download refused");
            return Ok(None);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoverError::Network(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(None);
        }

        let jpeg = reencode_jpeg(&bytes)?;
        self.cache.insert(url.to_string(), jpeg.clone()).await;
        tracing::debug!(url = %url, size = jpeg.len(), "Cover fetched and encoded");

        Ok(Some(jpeg))
    }
}

/// Decode an image of any supported format and re-encode it as RGB JPEG, the
/// one format every tag container embeds without fuss.
fn reencode_jpeg(bytes: &[u8]) -> Result<Vec<u8>, CoverError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| CoverError::Decode(e.to_string()))?;

    let mut out = Vec::new();
    decoded
        .to_rgb8()
        .write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
        .map_err(|e| CoverError::Decode(e.to_string()))?;

    Ok(out)
}
