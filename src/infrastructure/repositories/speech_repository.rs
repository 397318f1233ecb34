use crate::domain::narration::Voice;
use async_trait::async_trait;

#[derive(Debug, Clone, thiserror::Error)]
#[error("speech synthesis failed: {0}")]
pub struct SynthesisError(pub String);

/// Repository for speech synthesis.
/// Abstracts the underlying TTS provider (OpenAI, ElevenLabs, etc.)
#[async_trait]
pub trait SpeechRepository: Send + Sync {
    /// Synthesize a single chunk of text
    ///
    /// Returns the complete MP3 payload; nothing is returned until every byte
    /// has been received.
    ///
    /// # Arguments
    /// * `text` - Text to speak, already within the provider's length budget
    /// * `voice` - Voice profile
    /// * `instruction` - Natural-language speaking directive
    async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        instruction: &str,
    ) -> Result<Vec<u8>, SynthesisError>;
}
