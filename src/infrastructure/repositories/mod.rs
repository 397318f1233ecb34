pub mod memory_narration_repository;
pub mod moka_session_repository;
pub mod narration_repository;
pub mod openai_speech_repository;
pub mod openai_translation_repository;
pub mod pg_narration_repository;
pub mod pg_session_repository;
pub mod session_repository;
pub mod speech_repository;
pub mod translation_repository;

pub use memory_narration_repository::InMemoryNarrationRepository;
pub use moka_session_repository::MokaSessionRepository;
pub use narration_repository::{NarrationRepository, RecordSummary, RepositoryError, StoreStats};
pub use openai_speech_repository::OpenAiSpeechRepository;
pub use openai_translation_repository::OpenAiTranslationRepository;
pub use pg_narration_repository::PgNarrationRepository;
pub use pg_session_repository::PgSessionRepository;
pub use session_repository::SessionRepository;
pub use speech_repository::{SpeechRepository, SynthesisError};
pub use translation_repository::{TranslationError, TranslationRepository};
