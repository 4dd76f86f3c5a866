//! Error type for the messaging core.

use courier_commons::{CommonError, TopicId};
use courier_store::StorageError;
use thiserror::Error;

/// Errors surfaced by the messaging core.
#[derive(Error, Debug)]
pub enum CourierError {
    #[error("Topic not found: {0}")]
    TopicNotFound(TopicId),

    #[error("Topic already exists: {0}")]
    TopicAlreadyExists(TopicId),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CommonError> for CourierError {
    fn from(err: CommonError) -> Self {
        match err {
            CommonError::InvalidInput(msg) => CourierError::BadRequest(msg),
            CommonError::NotFound(msg) => CourierError::BadRequest(msg),
            CommonError::AlreadyExists(msg) => CourierError::BadRequest(msg),
            CommonError::Internal(msg) => CourierError::Serialization(msg),
        }
    }
}

pub type Result<T> = std::result::Result<T, CourierError>;
