pub mod chunker;
pub mod error;
pub mod fingerprint;
pub mod length;
pub mod model;
pub mod service;

pub use chunker::{plan, ChunkPlanner, ChunkingError, DEFAULT_CHUNK_BUDGET};
pub use error::{ChunkStage, NarrationServiceError};
pub use fingerprint::{content_key, StrictKey, TranslationKey};
pub use length::{CharEstimator, LengthEstimator, TiktokenEstimator};
pub use model::{
    Artifact, ChunkOutcome, ChunkRequest, NarrationRecord, NewRecord, NewTranslation,
    OutcomeSource, Tone, UpsertOutcome, Voice,
};
pub use service::{
    NarrationService, NarrationServiceApi, TranslationOutcome, DEFAULT_TARGET_LANGUAGE,
};
