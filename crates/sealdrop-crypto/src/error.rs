use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

#[derive(Debug, Error)]
pub enum CryptoError {
    /// The OS random source could not deliver bytes. Never recovered from.
    #[error("random source unavailable: {0}")]
    RandomSource(String),

    /// Tag check failed. Deliberately says nothing about which input was wrong.
    #[error("verification failed")]
    Verification,

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Text form of a key, IV, or tag could not be decoded
    #[error("invalid {field} encoding: {reason}")]
    InvalidEncoding { field: &'static str, reason: String },
}
