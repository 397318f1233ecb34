use crate::domain::narration::ChunkingError;
use crate::error::AppError;
use crate::infrastructure::repositories::RepositoryError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum SessionServiceError {
    #[error("session {0} not found or expired")]
    SessionNotFound(Uuid),
    #[error("session {0} has no chunks left")]
    SessionExhausted(Uuid),
    #[error("session {0} was advanced concurrently")]
    SessionConflict(Uuid),
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Chunking(#[from] ChunkingError),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<RepositoryError> for SessionServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => SessionServiceError::SessionNotFound(id),
            other => SessionServiceError::Dependency(other.to_string()),
        }
    }
}

impl From<AppError> for SessionServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => SessionServiceError::Invalid(msg),
            _ => SessionServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<SessionServiceError> for AppError {
    fn from(err: SessionServiceError) -> Self {
        match err {
            SessionServiceError::SessionNotFound(_) => AppError::NotFound(err.to_string()),
            SessionServiceError::SessionExhausted(_) => AppError::Conflict(err.to_string()),
            SessionServiceError::SessionConflict(_) => AppError::Conflict(err.to_string()),
            SessionServiceError::Invalid(msg) => AppError::BadRequest(msg),
            SessionServiceError::Chunking(e) => AppError::BadRequest(e.to_string()),
            SessionServiceError::Dependency(msg) => AppError::StoreUnavailable(msg),
            SessionServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
