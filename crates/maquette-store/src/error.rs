use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("metadata serialization failed: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("invalid store root: {0}")]
    InvalidRoot(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
