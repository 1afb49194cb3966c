//! HTTP boundary: hex text in and out, raw bytes for file content
//!
//! Routes:
//!   POST /upload              - multipart field `file`
//!   GET  /download/{id}       - query `key`, `iv`, `authTag` (lowercase hex)

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderValue},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use opendal::Operator;
use prometheus_client::registry::Registry;
use sealdrop_core::config::SealdropConfig;
use sealdrop_crypto::{AuthTag, Iv, KeyMaterial};
use sealdrop_storage::{ObjectId, OpendalStore};
use sealdrop_transfer::{
    AuditSink, FanoutAuditSink, JsonLinesAuditSink, TracingAuditSink, TransferCoordinator,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::headers;
use crate::metrics::{self, Metrics};
use crate::rate_limit::{self, RateLimiter};

/// Slack on top of `max_upload_bytes` for multipart boundaries and part headers
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: TransferCoordinator,
    pub operator: Operator,
    pub registry: Arc<Registry>,
    pub limiter: Option<Arc<RateLimiter>>,
    pub cors_origin: HeaderValue,
    pub max_upload_bytes: usize,
}

impl AppState {
    /// Wire store, audit sinks, metrics, and limits from config.
    pub fn build(config: &SealdropConfig, operator: Operator) -> Result<Self> {
        let mut registry = Registry::default();
        let metrics = Metrics::register(&mut registry);

        let mut audit = FanoutAuditSink::new().with(Arc::new(metrics));
        if config.audit.tracing {
            audit = audit.with(Arc::new(TracingAuditSink));
        }
        if let Some(path) = &config.audit.log_file {
            let sink = JsonLinesAuditSink::open(path)?;
            info!(path = %sink.path().display(), "audit log: appending");
            audit = audit.with(Arc::new(sink));
        }
        let audit: Arc<dyn AuditSink> = Arc::new(audit);

        let store = Arc::new(OpendalStore::new(operator.clone()));
        let coordinator = TransferCoordinator::new(store, audit);

        let limiter = config.rate_limit.enabled.then(|| {
            Arc::new(RateLimiter::new(
                Duration::from_secs(config.rate_limit.window_secs),
                config.rate_limit.max_requests,
            ))
        });

        let cors_origin = HeaderValue::from_str(&config.server.cors_origin)
            .with_context(|| format!("invalid cors_origin {:?}", config.server.cors_origin))?;

        Ok(Self {
            coordinator,
            operator,
            registry: Arc::new(registry),
            limiter,
            cors_origin,
            max_upload_bytes: config.server.max_upload_bytes,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/upload", post(upload_handler))
        .route("/download/{id}", get(download_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .route("/healthz", get(metrics::healthz_handler))
        .route("/readyz", get(metrics::readyz_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit::enforce,
        ))
        .layer(middleware::from_fn_with_state(state.clone(), headers::apply))
        .with_state(state)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    filename: String,
    hash: String,
    key: String,
    iv: String,
    auth_tag: String,
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(ApiError::multipart)? {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field.bytes().await.map_err(ApiError::multipart)?;
        if data.len() > state.max_upload_bytes {
            return Err(ApiError::PayloadTooLarge);
        }

        let receipt = state.coordinator.ingest(&data, &name).await?;
        info!(object_id = %receipt.object_id, size = receipt.size, "upload encrypted");

        return Ok(Json(UploadResponse {
            message: "File uploaded and encrypted successfully",
            filename: receipt.object_id.to_string(),
            hash: receipt.digest.to_hex(),
            key: receipt.key.to_hex(),
            iv: receipt.iv.to_hex(),
            auth_tag: receipt.tag.to_hex(),
        }));
    }

    Err(ApiError::bad_request("no file uploaded"))
}

#[derive(Debug, Deserialize)]
struct DownloadParams {
    key: Option<String>,
    iv: Option<String>,
    #[serde(rename = "authTag")]
    auth_tag: Option<String>,
}

async fn download_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<DownloadParams>,
) -> Result<Response, ApiError> {
    let (Some(key), Some(iv), Some(auth_tag)) = (params.key, params.iv, params.auth_tag) else {
        return Err(ApiError::bad_request("missing decryption parameters"));
    };

    let object_id = ObjectId::parse(&id).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let key = KeyMaterial::from_hex(&key).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let iv = Iv::from_hex(&iv).map_err(|e| ApiError::bad_request(e.to_string()))?;
    let tag = AuthTag::from_hex(&auth_tag).map_err(|e| ApiError::bad_request(e.to_string()))?;

    let payload = state.coordinator.egress(&object_id, &key, &iv, &tag).await?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{object_id}\""))
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
        ],
        payload.plaintext,
    )
        .into_response())
}
