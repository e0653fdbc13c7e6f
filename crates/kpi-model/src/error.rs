use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("snapshot decode error: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("snapshot root must be an object, got {0}")]
    NotAnObject(&'static str),
}
