//! sealdrop-transfer: one ingest or egress, end to end
//!
//! The coordinator is the only piece that sees both the envelope cipher and
//! the object store. Each call walks
//! `Start → Reading → CryptoOp → {Success | CryptoFailure | StorageFailure} → Recorded`
//! and nothing is retried.

pub mod audit;
pub mod coordinator;
pub mod error;

pub use audit::{AuditSink, FanoutAuditSink, JsonLinesAuditSink, MemoryAuditSink, TracingAuditSink};
pub use coordinator::{EgressPayload, IngestReceipt, TransferCoordinator};
pub use error::{TransferError, TransferResult};
