use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// A second record collided with a unique key (one prediction per article).
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("External service failure: {0}")]
    ExternalService(String),

    #[error("Malformed analysis output: {0}")]
    MalformedAnalysisOutput(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// Errors caused by the caller rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidIdentifier(_) | Error::NotFound(_) | Error::Validation(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
