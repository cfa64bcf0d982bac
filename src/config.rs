//! Runtime settings for retrieval and the encode worker.
//!
//! Every field has a default, so an empty JSON object is a valid config file:
//!
//! ```
//! use wavetrim_lib::config::TrimConfig;
//!
//! let config: TrimConfig = serde_json::from_str(r#"{ "fetch_timeout_secs": 5 }"#).unwrap();
//! assert_eq!(config.fetch_timeout_secs, 5);
//! assert_eq!(config.worker_thread_name, "wav-encoder");
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{AudioError, Result};

const DEFAULT_MAX_FETCH_BYTES: u64 = 512 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimConfig {
    /// Timeout for HTTP retrieval, in seconds
    pub fetch_timeout_secs: u64,

    /// Largest body accepted from a locator
    pub max_fetch_bytes: u64,

    /// How long to wait for the encode worker's reply. `None` waits forever.
    pub worker_timeout_ms: Option<u64>,

    /// Thread name given to each encode worker
    pub worker_thread_name: String,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: 30,
            max_fetch_bytes: DEFAULT_MAX_FETCH_BYTES,
            worker_timeout_ms: None,
            worker_thread_name: "wav-encoder".to_string(),
        }
    }
}

impl TrimConfig {
    /// Load a JSON config file. Missing keys take their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AudioError::FileOpen {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;

        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AudioError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fetch_timeout_secs == 0 {
            return Err(AudioError::Config(
                "fetch_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.max_fetch_bytes == 0 {
            return Err(AudioError::Config(
                "max_fetch_bytes must be greater than zero".to_string(),
            ));
        }
        if self.worker_timeout_ms == Some(0) {
            return Err(AudioError::Config(
                "worker_timeout_ms must be greater than zero when set".to_string(),
            ));
        }
        if self.worker_thread_name.contains('\0') {
            return Err(AudioError::Config(
                "worker_thread_name must not contain NUL bytes".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn worker_timeout(&self) -> Option<Duration> {
        self.worker_timeout_ms.map(Duration::from_millis)
    }
}
