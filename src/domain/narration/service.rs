use super::error::NarrationServiceError;
use super::fingerprint::{StrictKey, TranslationKey};
use super::model::{
    Artifact, ChunkOutcome, ChunkRequest, NarrationRecord, NewRecord, NewTranslation,
    OutcomeSource, Tone, UpsertOutcome,
};
use crate::infrastructure::repositories::{
    NarrationRepository, SpeechRepository, TranslationRepository,
};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_TARGET_LANGUAGE: &str = "Simplified Chinese";

/// Result of a standalone translation request
#[derive(Debug, Clone, Serialize)]
pub struct TranslationOutcome {
    pub record_id: Uuid,
    pub original_text: String,
    pub translated_text: String,
    /// True when an earlier translation of the same text was reused
    pub reused: bool,
}

pub struct NarrationService {
    store: Arc<dyn NarrationRepository>,
    translator: Arc<dyn TranslationRepository>,
    synthesizer: Arc<dyn SpeechRepository>,
    target_language: String,
}

impl NarrationService {
    pub fn new(
        store: Arc<dyn NarrationRepository>,
        translator: Arc<dyn TranslationRepository>,
        synthesizer: Arc<dyn SpeechRepository>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            store,
            translator,
            synthesizer,
            target_language: target_language.into(),
        }
    }

    pub fn target_language(&self) -> &str {
        &self.target_language
    }
}

#[async_trait]
pub trait NarrationServiceApi: Send + Sync {
    /// Produce audio for one chunk, reusing stored work where possible
    ///
    /// The chunk goes through lookup, translate, synthesize and persist.
    /// Stages are skipped when an earlier stage already has the answer:
    /// - a stored record with audio for the exact key is returned as-is
    /// - a stored standalone translation is reused and later upgraded in place
    ///
    /// Lookup and persist failures degrade (miss, transient audio) instead of
    /// failing the chunk. Translation failure falls back to the original text.
    async fn process_chunk(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkOutcome, NarrationServiceError>;

    /// Translate text without synthesizing audio, storing the translation for reuse
    async fn translate_standalone(
        &self,
        text: String,
        source_url: Option<String>,
    ) -> Result<TranslationOutcome, NarrationServiceError>;

    /// Stored audio bytes for a record
    async fn audio_for(&self, record_id: Uuid) -> Result<Vec<u8>, NarrationServiceError>;

    /// Most recent records, newest first
    async fn history(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NarrationRecord>, NarrationServiceError>;
}

#[async_trait]
impl NarrationServiceApi for NarrationService {
    async fn process_chunk(
        &self,
        request: ChunkRequest,
    ) -> Result<ChunkOutcome, NarrationServiceError> {
        let chunk_text = request.text.trim().to_string();
        if chunk_text.is_empty() {
            return Err(NarrationServiceError::Invalid(
                "chunk text is empty".to_string(),
            ));
        }

        tracing::info!(
            text_length = chunk_text.len(),
            voice = %request.voice,
            tone = %request.tone,
            translate = request.translate,
            "Processing chunk"
        );

        let key = StrictKey::new(&chunk_text, request.translate, request.voice, request.tone);

        // 1. Exact match with audio
        if let Some(hit) = self.lookup_complete(&key).await {
            tracing::info!(record_id = %hit.id, "Cache hit - reusing stored audio");
            return Ok(cache_hit(chunk_text, hit));
        }

        // 2. Translation, either reused from a standalone record or fresh
        let mut upgrade_target = None;
        let mut translated_text = None;
        if request.translate {
            match self.lookup_standalone(&key.translation_key()).await {
                Some(standalone) => {
                    tracing::info!(
                        record_id = %standalone.id,
                        "Reusing standalone translation"
                    );
                    upgrade_target = Some(standalone.id);
                    translated_text = standalone.translated_text;
                }
                None => match self
                    .translator
                    .translate(&chunk_text, &self.target_language)
                    .await
                {
                    Ok(text) => translated_text = Some(text),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Translation failed, narrating original text"
                        );
                    }
                },
            }
        }

        let language_flag = translated_text.is_some();

        // Degraded to the original language: that audio may already exist
        if request.translate && !language_flag {
            let fallback_key = StrictKey::new(&chunk_text, false, request.voice, request.tone);
            if let Some(hit) = self.lookup_complete(&fallback_key).await {
                tracing::info!(
                    record_id = %hit.id,
                    "Cache hit for untranslated fallback"
                );
                return Ok(cache_hit(chunk_text, hit));
            }
        }

        // 3 and 4. Synthesis and persistence run detached so that a caller
        // dropping this future does not discard paid work.
        let record = NewRecord {
            original_text: chunk_text.clone(),
            translated_text: translated_text.clone(),
            language_flag,
            voice: request.voice,
            tone: request.tone,
            audio_data: Vec::new(),
            source_url: request.source_url,
        };
        let instruction = speech_instruction(request.tone, language_flag, &self.target_language);
        let store = Arc::clone(&self.store);
        let synthesizer = Arc::clone(&self.synthesizer);

        let task = tokio::spawn(async move {
            let mut record = record;
            let speech_text = record
                .translated_text
                .as_deref()
                .unwrap_or(&record.original_text)
                .to_string();

            record.audio_data = synthesizer
                .synthesize(&speech_text, record.voice, &instruction)
                .await?;

            tracing::info!(
                audio_size = record.audio_data.len(),
                language_flag = record.language_flag,
                "Speech synthesized"
            );

            Ok::<_, NarrationServiceError>(persist(store.as_ref(), record, upgrade_target).await)
        });

        let (artifact, source) = task
            .await
            .map_err(|e| anyhow::anyhow!("synthesis task failed: {}", e))??;

        Ok(ChunkOutcome {
            chunk_text,
            translated_text,
            artifact,
            source,
        })
    }

    async fn translate_standalone(
        &self,
        text: String,
        source_url: Option<String>,
    ) -> Result<TranslationOutcome, NarrationServiceError> {
        let original_text = text.trim().to_string();
        if original_text.is_empty() {
            return Err(NarrationServiceError::Invalid(
                "text to translate is empty".to_string(),
            ));
        }

        let key = TranslationKey::new(&original_text, true);
        if let Some(existing) = self.lookup_standalone(&key).await {
            if let Some(translated_text) = existing.translated_text {
                tracing::info!(record_id = %existing.id, "Standalone translation reused");
                return Ok(TranslationOutcome {
                    record_id: existing.id,
                    original_text,
                    translated_text,
                    reused: true,
                });
            }
        }

        let translated_text = self
            .translator
            .translate(&original_text, &self.target_language)
            .await?;

        let saved = self
            .store
            .save_standalone_translation(NewTranslation {
                original_text: original_text.clone(),
                translated_text: translated_text.clone(),
                source_url,
            })
            .await?;

        tracing::info!(record_id = %saved.id, "Standalone translation saved");

        Ok(TranslationOutcome {
            record_id: saved.id,
            original_text,
            translated_text,
            reused: false,
        })
    }

    async fn audio_for(&self, record_id: Uuid) -> Result<Vec<u8>, NarrationServiceError> {
        self.store
            .fetch_audio(record_id)
            .await?
            .ok_or_else(|| NarrationServiceError::NotFound(format!("no audio for record {}", record_id)))
    }

    async fn history(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NarrationRecord>, NarrationServiceError> {
        if limit <= 0 || offset < 0 {
            return Err(NarrationServiceError::Invalid(
                "limit must be positive and offset non-negative".to_string(),
            ));
        }
        Ok(self.store.list_recent(limit, offset).await?)
    }
}

impl NarrationService {
    /// Complete record for the key; store errors count as a miss
    async fn lookup_complete(&self, key: &StrictKey) -> Option<NarrationRecord> {
        match self.store.find_complete(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(error = %e, "Cache lookup failed, treating as miss");
                None
            }
        }
    }

    async fn lookup_standalone(&self, key: &TranslationKey) -> Option<NarrationRecord> {
        match self.store.find_standalone_translation(key).await {
            Ok(found) => found,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    "Standalone translation lookup failed, treating as miss"
                );
                None
            }
        }
    }
}

fn cache_hit(chunk_text: String, record: NarrationRecord) -> ChunkOutcome {
    ChunkOutcome {
        chunk_text,
        translated_text: record.translated_text,
        artifact: Artifact::Stored {
            record_id: record.id,
        },
        source: OutcomeSource::CacheHit,
    }
}

fn speech_instruction(tone: Tone, translated: bool, target_language: &str) -> String {
    if translated {
        format!(
            "{} Please speak in fluent {} with natural pronunciation.",
            tone.instruction(),
            target_language
        )
    } else {
        tone.instruction().to_string()
    }
}

/// Store synthesized audio. A store failure yields transient audio instead of an error.
async fn persist(
    store: &dyn NarrationRepository,
    record: NewRecord,
    upgrade_target: Option<Uuid>,
) -> (Artifact, OutcomeSource) {
    match store.upsert_with_audio(&record, upgrade_target).await {
        Ok(UpsertOutcome::Upgraded(saved)) => {
            tracing::info!(record_id = %saved.id, "Standalone translation upgraded with audio");
            (
                Artifact::Stored { record_id: saved.id },
                OutcomeSource::Upgraded,
            )
        }
        Ok(UpsertOutcome::Inserted(saved)) => {
            tracing::info!(record_id = %saved.id, "Narration record stored");
            (
                Artifact::Stored { record_id: saved.id },
                OutcomeSource::Synthesized,
            )
        }
        Err(e) => {
            let record_id = Uuid::new_v4();
            tracing::error!(
                error = %e,
                record_id = %record_id,
                "Failed to persist audio, returning transient artifact"
            );
            (
                Artifact::Transient {
                    record_id,
                    audio_data: record.audio_data,
                },
                OutcomeSource::Synthesized,
            )
        }
    }
}
