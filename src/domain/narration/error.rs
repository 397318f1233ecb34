use crate::error::AppError;
use crate::infrastructure::repositories::{RepositoryError, SynthesisError, TranslationError};

/// Pipeline stage a chunk was in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkStage {
    Translate,
    Synthesize,
}

impl std::fmt::Display for ChunkStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ChunkStage::Translate => "translate",
            ChunkStage::Synthesize => "synthesize",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NarrationServiceError {
    #[error("invalid input: {0}")]
    Invalid(String),
    #[error(transparent)]
    Translation(#[from] TranslationError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("dependency error: {0}")]
    Dependency(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl NarrationServiceError {
    /// Stage the error belongs to, when it came from a pipeline stage
    pub fn stage(&self) -> Option<ChunkStage> {
        match self {
            Self::Translation(_) => Some(ChunkStage::Translate),
            Self::Synthesis(_) => Some(ChunkStage::Synthesize),
            _ => None,
        }
    }
}

impl From<RepositoryError> for NarrationServiceError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => NarrationServiceError::NotFound(format!("record {}", id)),
            other => NarrationServiceError::Dependency(other.to_string()),
        }
    }
}

impl From<AppError> for NarrationServiceError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::BadRequest(msg) => NarrationServiceError::Invalid(msg),
            AppError::NotFound(msg) => NarrationServiceError::NotFound(msg),
            _ => NarrationServiceError::Dependency(err.to_string()),
        }
    }
}

impl From<NarrationServiceError> for AppError {
    fn from(err: NarrationServiceError) -> Self {
        match err {
            NarrationServiceError::Invalid(msg) => AppError::BadRequest(msg),
            NarrationServiceError::Translation(e) => AppError::ExternalService(e.to_string()),
            NarrationServiceError::Synthesis(e) => AppError::ExternalService(e.to_string()),
            NarrationServiceError::NotFound(msg) => AppError::NotFound(msg),
            NarrationServiceError::Dependency(msg) => AppError::StoreUnavailable(msg),
            NarrationServiceError::Other(e) => AppError::Internal(e.to_string()),
        }
    }
}
