use crate::domain::narration::fingerprint::{StrictKey, TranslationKey};
use crate::domain::narration::{NarrationRecord, NewRecord, NewTranslation, UpsertOutcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// The store could not be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// The store was reached but the write did not go through
    #[error("persistence failed: {0}")]
    Persistence(String),
    #[error("record not found: {0}")]
    NotFound(Uuid),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => RepositoryError::Unavailable(err.to_string()),
            other => RepositoryError::Persistence(other.to_string()),
        }
    }
}

/// Record fields the offline cleanup needs to rank duplicates
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RecordSummary {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub audio_present: bool,
    pub content_key: String,
    pub created_at: DateTime<Utc>,
}

impl RecordSummary {
    pub fn is_standalone_translation(&self) -> bool {
        !self.audio_present && self.translated_text.is_some()
    }
}

impl From<&NarrationRecord> for RecordSummary {
    fn from(record: &NarrationRecord) -> Self {
        Self {
            id: record.id,
            original_text: record.original_text.clone(),
            translated_text: record.translated_text.clone(),
            audio_present: record.audio_present,
            content_key: record.content_key.clone(),
            created_at: record.created_at,
        }
    }
}

/// Aggregate counts over the whole collection
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub total: i64,
    pub with_audio: i64,
    pub translated: i64,
    pub standalone_translations: i64,
    pub by_voice: BTreeMap<String, i64>,
    pub by_tone: BTreeMap<String, i64>,
}

/// Document store backing the narration cache.
///
/// Implementations must:
/// - never overwrite a record that already has audio
/// - upgrade a standalone translation with a conditional write keyed by id
/// - only delete through `delete`, which the online path never calls
#[async_trait]
pub trait NarrationRepository: Send + Sync {
    /// Record with audio matching the strict key, newest first
    async fn find_complete(&self, key: &StrictKey)
        -> Result<Option<NarrationRecord>, RepositoryError>;

    /// Translation without audio matching the translation key, newest first
    async fn find_standalone_translation(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError>;

    /// Attach audio to `upgrade_target` if it is still a standalone translation,
    /// otherwise insert `record` as a new document
    async fn upsert_with_audio(
        &self,
        record: &NewRecord,
        upgrade_target: Option<Uuid>,
    ) -> Result<UpsertOutcome, RepositoryError>;

    async fn save_standalone_translation(
        &self,
        translation: NewTranslation,
    ) -> Result<NarrationRecord, RepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NarrationRecord>, RepositoryError>;

    async fn fetch_audio(&self, id: Uuid) -> Result<Option<Vec<u8>>, RepositoryError>;

    /// Most recent records first
    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NarrationRecord>, RepositoryError>;

    async fn list_summaries(&self) -> Result<Vec<RecordSummary>, RepositoryError>;

    async fn set_content_key(&self, id: Uuid, content_key: &str) -> Result<(), RepositoryError>;

    /// Returns whether a record was removed
    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError>;

    async fn stats(&self) -> Result<StoreStats, RepositoryError>;
}
