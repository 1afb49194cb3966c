use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("storage failure: {0}")]
    Storage(String),
}

impl StoreError {
    /// Classify an OpenDAL error for object `id`.
    pub fn from_opendal(id: &str, err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => StoreError::NotFound(id.to_string()),
            _ => StoreError::Storage(err.to_string()),
        }
    }
}
