use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
#[error("translation failed: {0}")]
pub struct TranslationError(pub String);

/// Repository for text translation.
/// Abstracts the underlying AI provider; the caller decides what a failure means.
#[async_trait]
pub trait TranslationRepository: Send + Sync {
    /// Translate `text` into `target_language` (a human-readable language name)
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError>;
}
