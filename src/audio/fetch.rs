//! Retrieval of the raw bytes behind a locator.
//!
//! A locator is an `http(s)://` URL, a `file://` URL, or a plain filesystem
//! path. Retrieval never interprets the bytes; that is the decoder's job.

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::audio::types::is_supported_mime_type;
use crate::config::TrimConfig;
use crate::error::{AudioError, Result};

/// Read every byte behind `locator`
pub async fn fetch_bytes(locator: &str, config: &TrimConfig) -> Result<Vec<u8>> {
    match Url::parse(locator) {
        Ok(url) => match url.scheme() {
            "http" | "https" => fetch_http(url, config).await,
            "file" => {
                let path = url.to_file_path().map_err(|_| AudioError::Fetch {
                    locator: locator.to_string(),
                    reason: "file URL does not name a local path".to_string(),
                })?;
                read_local(&path.to_string_lossy(), config).await
            }
            other if other.len() == 1 => {
                // Windows drive letter, e.g. C:\audio\clip.wav
                read_local(locator, config).await
            }
            other => Err(AudioError::Fetch {
                locator: locator.to_string(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        },
        // Not a URL at all: treat as a path
        Err(_) => read_local(locator, config).await,
    }
}

async fn read_local(path: &str, config: &TrimConfig) -> Result<Vec<u8>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| AudioError::FileOpen {
            path: path.to_string(),
            source: e,
        })?;

    if metadata.len() > config.max_fetch_bytes {
        return Err(too_large(path, metadata.len(), config));
    }

    let bytes = tokio::fs::read(path).await.map_err(|e| AudioError::FileOpen {
        path: path.to_string(),
        source: e,
    })?;

    debug!(path, bytes = bytes.len(), "Read local audio source");
    Ok(bytes)
}

async fn fetch_http(url: Url, config: &TrimConfig) -> Result<Vec<u8>> {
    let locator = url.to_string();
    let fail = |reason: String| AudioError::Fetch {
        locator: locator.clone(),
        reason,
    };

    let client = Client::builder()
        .timeout(config.fetch_timeout())
        .build()
        .map_err(|e| fail(format!("failed to build HTTP client: {}", e)))?;

    debug!(url = %url, "Fetching audio source");

    let mut response = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(|e| {
            warn!(locator = %locator, error = %e, "HTTP fetch failed");
            if e.is_timeout() {
                fail("request timed out".to_string())
            } else {
                fail(e.to_string())
            }
        })?;

    if let Some(declared) = response.content_length() {
        if declared > config.max_fetch_bytes {
            return Err(too_large(&locator, declared, config));
        }
    }

    // Servers often mislabel audio; the decoder has the final say
    if let Some(content_type) = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        if !is_supported_mime_type(content_type) {
            warn!(locator = %locator, content_type, "Unexpected content type for audio source");
        }
    }

    // Stream the body so an undeclared oversize response is cut off early
    let mut bytes = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| fail(format!("failed to read body: {}", e)))?
    {
        if (bytes.len() + chunk.len()) as u64 > config.max_fetch_bytes {
            return Err(too_large(
                &locator,
                (bytes.len() + chunk.len()) as u64,
                config,
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    debug!(locator = %locator, bytes = bytes.len(), "Fetched audio source");
    Ok(bytes)
}

fn too_large(locator: &str, size: u64, config: &TrimConfig) -> AudioError {
    AudioError::Fetch {
        locator: locator.to_string(),
        reason: format!(
            "{} bytes exceeds the {} byte limit",
            size, config.max_fetch_bytes
        ),
    }
}
