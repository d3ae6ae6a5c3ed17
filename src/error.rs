/// Everything that can go wrong while scheduling or loading inputs.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid rating {0}: expected 1 (again), 2 (hard), 3 (good) or 4 (easy)")]
    InvalidRating(i64),
    #[error("invalid card state {0:?}: expected new, learning, review or relearning")]
    InvalidState(String),
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("invalid card: {0}")]
    InvalidCard(String),
    #[error("invalid timestamp {0:?}")]
    InvalidTimestamp(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
