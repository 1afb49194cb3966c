use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of a transfer through the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Plaintext in, ciphertext stored
    Ingest,
    /// Ciphertext read, plaintext out
    Egress,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Ingest => "ingest",
            Operation::Egress => "egress",
        }
    }
}

/// Terminal state of one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    RandomSourceFailure,
    EncryptionFailure,
    StorageFailure,
    ObjectNotFound,
    VerificationFailure,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::RandomSourceFailure => "random_source_failure",
            Outcome::EncryptionFailure => "encryption_failure",
            Outcome::StorageFailure => "storage_failure",
            Outcome::ObjectNotFound => "object_not_found",
            Outcome::VerificationFailure => "verification_failure",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Append-only audit entry describing one ingest or egress.
///
/// `size` and `digest` describe the plaintext and are only known once the
/// plaintext exists on the relay side, so failed egress records carry `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub object_id: String,
    pub operation: Operation,
    pub size: Option<u64>,
    /// Lowercase hex SHA-256 of the plaintext
    pub digest: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub outcome: Outcome,
}

impl TransferRecord {
    pub fn new(object_id: impl Into<String>, operation: Operation, outcome: Outcome) -> Self {
        Self {
            object_id: object_id.into(),
            operation,
            size: None,
            digest: None,
            timestamp: Utc::now(),
            outcome,
        }
    }

    pub fn with_plaintext(mut self, size: u64, digest: impl Into<String>) -> Self {
        self.size = Some(size);
        self.digest = Some(digest.into());
        self
    }
}
