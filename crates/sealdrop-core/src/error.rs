use thiserror::Error;

pub type SealdropResult<T> = Result<T, SealdropError>;

#[derive(Debug, Error)]
pub enum SealdropError {
    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
