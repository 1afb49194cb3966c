//! Prometheus /metrics + health check HTTP endpoints
//!
//! Endpoints:
//!   GET /metrics  - Prometheus text format
//!   GET /healthz  - Liveness probe (always 200 if process is running)
//!   GET /readyz   - Readiness probe (200 if storage is reachable)

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use prometheus_client::{
    encoding::{text::encode, EncodeLabelSet},
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};
use sealdrop_core::{Operation, TransferRecord};
use sealdrop_transfer::AuditSink;

use crate::server::AppState;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct TransferLabels {
    pub operation: String,
    pub outcome: String,
}

/// Transfer counters, fed from the audit trail
#[derive(Clone, Default)]
pub struct Metrics {
    transfers: Family<TransferLabels, Counter>,
    ingested_bytes: Counter,
}

impl Metrics {
    pub fn register(registry: &mut Registry) -> Self {
        let metrics = Self::default();
        registry.register(
            "sealdrop_transfers",
            "Completed ingest/egress operations by outcome",
            metrics.transfers.clone(),
        );
        registry.register(
            "sealdrop_ingested_bytes",
            "Plaintext bytes accepted by successful ingests",
            metrics.ingested_bytes.clone(),
        );
        metrics
    }
}

impl AuditSink for Metrics {
    fn record(&self, record: &TransferRecord) {
        self.transfers
            .get_or_create(&TransferLabels {
                operation: record.operation.as_str().to_string(),
                outcome: record.outcome.as_str().to_string(),
            })
            .inc();
        if record.operation == Operation::Ingest && record.outcome.is_success() {
            self.ingested_bytes.inc_by(record.size.unwrap_or(0));
        }
    }
}

pub async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut body = String::new();
    match encode(&mut body, &state.registry) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            tracing::error!("metrics encode failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Liveness probe: returns 200 if the process is running.
pub async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Readiness probe: returns 200 if storage is reachable, 503 otherwise.
pub async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    match sealdrop_storage::check_health(&state.operator).await {
        Ok(()) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!("readiness: {e}");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unreachable")
        }
    }
}
