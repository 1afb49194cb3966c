use sealdrop_core::Outcome;
use sealdrop_crypto::CryptoError;
use sealdrop_storage::StoreError;
use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

/// Caller-visible failure of an ingest or egress. Each variant is distinct on
/// purpose; none of them is folded into another.
#[derive(Debug, Error)]
pub enum TransferError {
    /// OS randomness unavailable; aborted before anything was written
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// The AEAD primitive refused the input (payload beyond the GCM limit)
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("storage failure: {0}")]
    Storage(String),

    #[error("object not found: {0}")]
    NotFound(String),

    /// Wrong key, IV, tag, or altered ciphertext. Which one is never reported.
    #[error("verification failed")]
    Verification,
}

impl TransferError {
    pub fn outcome(&self) -> Outcome {
        match self {
            TransferError::RandomSource(_) => Outcome::RandomSourceFailure,
            TransferError::Encryption(_) => Outcome::EncryptionFailure,
            TransferError::Storage(_) => Outcome::StorageFailure,
            TransferError::NotFound(_) => Outcome::ObjectNotFound,
            TransferError::Verification => Outcome::VerificationFailure,
        }
    }
}

impl From<StoreError> for TransferError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => TransferError::NotFound(id),
            StoreError::Storage(msg) => TransferError::Storage(msg),
        }
    }
}

impl From<CryptoError> for TransferError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::RandomSource(msg) => TransferError::RandomSource(msg),
            CryptoError::Encryption(msg) => TransferError::Encryption(msg),
            CryptoError::Verification | CryptoError::InvalidEncoding { .. } => {
                TransferError::Verification
            }
        }
    }
}
