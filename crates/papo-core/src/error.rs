use papo_db::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("invalid name: {0}")]
    InvalidName(String),
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("invalid query: {0}")]
    InvalidQuery(String),
    #[error("participant already exists: {0}")]
    AlreadyExists(String),
    #[error("participant not found: {0}")]
    NotFound(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),
}

pub type ChatResult<T> = Result<T, ChatError>;
