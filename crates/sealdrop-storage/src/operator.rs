//! OpenDAL Operator factory for sealdrop storage backends

use anyhow::{Context, Result};
use opendal::Operator;
use sealdrop_core::config::{StorageBackend, StorageConfig};

/// Build an operator for the configured backend.
///
/// No retry layer is installed: a failed write is reported to the caller
/// rather than replayed.
pub fn build_from_core_config(storage: &StorageConfig) -> Result<Operator> {
    let op = match storage.backend {
        StorageBackend::Fs => build_fs(storage)?,
        StorageBackend::Memory => Operator::new(opendal::services::Memory::default())
            .context("creating OpenDAL memory operator")?
            .finish(),
        StorageBackend::S3 => build_s3(storage)?,
    };
    Ok(op.layer(opendal::layers::LoggingLayer::default()))
}

fn build_fs(storage: &StorageConfig) -> Result<Operator> {
    std::fs::create_dir_all(&storage.root)
        .with_context(|| format!("creating storage root {}", storage.root.display()))?;
    let root = std::path::absolute(&storage.root)
        .with_context(|| format!("resolving storage root {}", storage.root.display()))?;
    let staging = root.join(".staging");

    // Writes land in the staging dir first and are renamed into place, so an
    // interrupted upload never leaves a partial `.enc` behind.
    let builder = opendal::services::Fs::default()
        .root(&root.to_string_lossy())
        .atomic_write_dir(&staging.to_string_lossy());

    Ok(Operator::new(builder)
        .context("creating OpenDAL fs operator")?
        .finish())
}

/// S3 or any S3-compatible endpoint, path-style addressing.
///
/// If `enforce_tls` is true and the endpoint uses HTTP, this returns an error.
/// Otherwise, a warning is logged for non-HTTPS endpoints.
fn build_s3(storage: &StorageConfig) -> Result<Operator> {
    if storage.endpoint.starts_with("http://") {
        if storage.enforce_tls {
            anyhow::bail!(
                "S3 endpoint uses plaintext HTTP ({}), but enforce_tls is enabled. \
                 Use an HTTPS endpoint or set storage.enforce_tls = false for local development.",
                storage.endpoint
            );
        }
        tracing::warn!(
            endpoint = %storage.endpoint,
            "S3 endpoint uses plaintext HTTP; credentials and ciphertext travel unencrypted"
        );
    }

    let mut builder = opendal::services::S3::default()
        .endpoint(&storage.endpoint)
        .region(&storage.region)
        .bucket(&storage.bucket);
    if let Some(id) = &storage.access_key_id {
        builder = builder.access_key_id(id);
    }
    if let Some(secret) = &storage.secret_access_key {
        builder = builder.secret_access_key(secret);
    }

    Ok(Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_build_memory() {
        let storage = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        assert!(build_from_core_config(&storage).is_ok());
    }

    #[test]
    fn test_build_fs_creates_root() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root: PathBuf = tmp.path().join("uploads");
        let storage = StorageConfig {
            backend: StorageBackend::Fs,
            root: root.clone(),
            ..Default::default()
        };

        assert!(build_from_core_config(&storage).is_ok());
        assert!(root.is_dir());
    }

    #[test]
    fn test_build_s3_http_warning() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: "http://localhost:9000".into(),
            enforce_tls: false,
            ..Default::default()
        };
        assert!(build_from_core_config(&storage).is_ok());
    }

    #[test]
    fn test_build_s3_http_enforce_tls() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: "http://insecure:9000".into(),
            enforce_tls: true,
            ..Default::default()
        };
        let result = build_from_core_config(&storage);
        assert!(result.is_err(), "HTTP + enforce_tls must fail");
        assert!(result.unwrap_err().to_string().contains("enforce_tls"));
    }

    #[test]
    fn test_build_s3_https() {
        let storage = StorageConfig {
            backend: StorageBackend::S3,
            endpoint: "https://s3.example.com".into(),
            enforce_tls: true,
            access_key_id: Some("key".into()),
            secret_access_key: Some("secret".into()),
            ..Default::default()
        };
        assert!(build_from_core_config(&storage).is_ok());
    }
}
