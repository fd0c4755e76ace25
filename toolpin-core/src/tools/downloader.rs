//! Remote fetch capability.
//!
//! Installers never talk to the network directly; they call a [`Fetcher`]
//! supplied by the host. [`HttpFetcher`] is the default implementation,
//! streaming the response body to disk with reqwest. Retries and redirect
//! policy belong to the fetcher, not to the installers.

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

// ============================================================================
// Fetcher Capability
// ============================================================================

/// Downloads a URL to a local file.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches `url` into `dest`, returning the number of bytes written.
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64>;
}

// ============================================================================
// URL Validation
// ============================================================================

/// Validates that a URL is usable for downloading.
///
/// Checks:
/// - URL must parse
/// - URL scheme must be HTTPS or HTTP (HTTP only logs a warning, for
///   internal mirrors)
/// - URL must have a host
fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL: {}", url_str))?;

    match url.scheme() {
        "https" => {}
        "http" => warn!("Downloading over plain HTTP: {}", url_str),
        other => anyhow::bail!("Unsupported URL scheme '{}': {}", other, url_str),
    }

    if url.host_str().is_none() {
        anyhow::bail!("URL must have a host: {}", url_str);
    }

    Ok(url)
}

/// Whole percent of `total` received so far, if the size is known.
fn percent_done(received: u64, total: Option<u64>) -> Option<u64> {
    match total {
        Some(0) => Some(100),
        Some(total) => Some(received.saturating_mul(100) / total),
        None => None,
    }
}

// ============================================================================
// HTTP Fetcher
// ============================================================================

/// Fetches archives over HTTP(S) with a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Creates a fetcher with a client identifying itself as toolpin.
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("toolpin/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        info!("Downloading {} to {}", url, dest.display());

        let url = validate_url(url)?;

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Failed to start download from {}", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!(
                "Download failed with status {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown error")
            );
        }

        let total_bytes = response.content_length();
        debug!("Content-Length: {:?}", total_bytes);

        let mut file = File::create(dest)
            .await
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;

        let mut stream = response.bytes_stream();
        let mut received: u64 = 0;
        let mut logged_decile = None;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.context("Failed to read chunk from response stream")?;
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            received += chunk.len() as u64;

            let decile = percent_done(received, total_bytes).map(|p| p / 10);
            if decile != logged_decile {
                logged_decile = decile;
                if let Some(decile) = decile {
                    debug!("{}: {}%", url, decile * 10);
                }
            }
        }

        file.flush().await.context("Failed to flush file")?;

        debug!("Fetched {} bytes into {}", received, dest.display());
        Ok(received)
    }
}
