use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{SealdropError, SealdropResult};

/// Top-level relay configuration (loaded from sealdrop.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SealdropConfig {
    pub server: ServerConfig,
    pub rate_limit: RateLimitConfig,
    pub storage: StorageConfig,
    pub audit: AuditConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address (default: 0.0.0.0:3000)
    pub listen: String,
    /// Largest accepted upload body in bytes (default: 50 MiB)
    pub max_upload_bytes: usize,
    /// Value for Access-Control-Allow-Origin (default: "*")
    pub cors_origin: String,
    /// Log level (default: info)
    pub log_level: String,
    /// Log format: "json" or "text"
    pub log_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Fixed window length in seconds (default: 900)
    pub window_secs: u64,
    /// Requests allowed per client IP per window (default: 100)
    pub max_requests: u32,
}

/// Which OpenDAL service backs the ciphertext store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    Memory,
    S3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory for the fs backend (default: uploads)
    pub root: PathBuf,
    /// S3-compatible endpoint
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket name
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Refuse plaintext HTTP S3 endpoints
    pub enforce_tls: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// JSON-lines transfer log (default: transfer.log); unset disables the file sink
    pub log_file: Option<PathBuf>,
    /// Also emit audit records as tracing events
    pub tracing: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".into(),
            max_upload_bytes: 50 * 1024 * 1024,
            cors_origin: "*".into(),
            log_level: "info".into(),
            log_format: "json".into(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window_secs: 15 * 60,
            max_requests: 100,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Fs,
            root: PathBuf::from("uploads"),
            endpoint: "http://localhost:9000".into(),
            region: "us-east-1".into(),
            bucket: "sealdrop".into(),
            access_key_id: None,
            secret_access_key: None,
            enforce_tls: false,
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: Some(PathBuf::from("transfer.log")),
            tracing: true,
        }
    }
}

impl SealdropConfig {
    pub fn from_toml(content: &str) -> SealdropResult<Self> {
        toml::from_str(content).map_err(|e| SealdropError::Config(e.to_string()))
    }
}

/// Load the config at `path`, falling back to defaults when the file is absent.
pub fn load_or_default(path: &Path) -> SealdropResult<SealdropConfig> {
    if !path.exists() {
        tracing::warn!("config file not found: {}  (using defaults)", path.display());
        return Ok(SealdropConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    SealdropConfig::from_toml(&content)
        .map_err(|e| SealdropError::Config(format!("parsing config {}: {e}", path.display())))
}
