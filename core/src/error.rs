use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("{message}")]
    Conflict { message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DeskError {
    pub fn validation(message: impl Into<String>) -> Self {
        DeskError::Validation { message: message.into() }
    }
}

pub type DeskResult<T> = Result<T, DeskError>;
