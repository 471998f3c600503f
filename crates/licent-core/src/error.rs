//! Error types for the Licent system.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LicentError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Entity already exists: {entity}")]
    AlreadyExists { entity: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type LicentResult<T> = Result<T, LicentError>;
