use thiserror::Error;

pub type Result<T> = std::result::Result<T, RecError>;

#[derive(Error, Debug)]
pub enum RecError {
    /// Nothing to build a matrix from. Fatal for the pipeline.
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Tensor(#[from] candle_core::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl RecError {
    /// Lookup misses are recoverable and reported as "not found" to callers.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RecError::UserNotFound(_) | RecError::ItemNotFound(_))
    }
}
