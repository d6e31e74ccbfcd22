use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CacheError {
    /// The worker task is gone (channel closed before or during a call).
    #[error("cache worker is not running")]
    WorkerGone,
}

pub type CacheResult<T> = Result<T, CacheError>;
