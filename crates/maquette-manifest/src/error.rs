use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("duplicate asset key: {0}")]
    DuplicateKey(String),
    #[error("unknown asset key: {0}")]
    UnknownKey(String),
    #[error("invalid asset path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
}

pub type ManifestResult<T> = Result<T, ManifestError>;
