use super::narration_repository::{NarrationRepository, RecordSummary, RepositoryError, StoreStats};
use crate::domain::narration::fingerprint::{StrictKey, TranslationKey};
use crate::domain::narration::{NarrationRecord, NewRecord, NewTranslation, UpsertOutcome};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

const RECORD_COLUMNS: &str = "id, original_text, translated_text, language_flag, voice, tone, \
     audio_present, content_key, source_url, created_at, updated_at";

/// Postgres-backed narration cache
pub struct PgNarrationRepository {
    pool: Arc<DbPool>,
}

impl PgNarrationRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    /// Conditional upgrade: only a row that still has no audio is touched
    async fn try_upgrade(
        &self,
        target: Uuid,
        record: &NewRecord,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        let pool = self.pool.as_ref();
        let upgraded = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            UPDATE narration_records
            SET audio_data = $2,
                voice = $3,
                tone = $4,
                source_url = COALESCE(source_url, $5),
                updated_at = $6
            WHERE id = $1
              AND audio_data IS NULL
              AND translated_text IS NOT NULL
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(target)
        .bind(&record.audio_data)
        .bind(record.voice)
        .bind(record.tone)
        .bind(&record.source_url)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(upgraded)
    }

    async fn insert(&self, record: &NewRecord) -> Result<NarrationRecord, RepositoryError> {
        let pool = self.pool.as_ref();
        let inserted = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            INSERT INTO narration_records
                (id, original_text, translated_text, language_flag, voice, tone,
                 audio_data, content_key, source_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&record.original_text)
        .bind(&record.translated_text)
        .bind(record.language_flag)
        .bind(record.voice)
        .bind(record.tone)
        .bind(&record.audio_data)
        .bind(record.content_key())
        .bind(&record.source_url)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(inserted)
    }
}

#[async_trait]
impl NarrationRepository for PgNarrationRepository {
    async fn find_complete(
        &self,
        key: &StrictKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM narration_records
            WHERE md5(original_text) = md5($1)
              AND original_text = $1
              AND language_flag = $2
              AND voice = $3
              AND tone = $4
              AND audio_present
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(&key.original_text)
        .bind(key.language_flag)
        .bind(key.voice)
        .bind(key.tone)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    async fn find_standalone_translation(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM narration_records
            WHERE md5(original_text) = md5($1)
              AND original_text = $1
              AND language_flag = $2
              AND NOT audio_present
              AND translated_text IS NOT NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#
        ))
        .bind(&key.original_text)
        .bind(key.language_flag)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    async fn upsert_with_audio(
        &self,
        record: &NewRecord,
        upgrade_target: Option<Uuid>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        if let Some(target) = upgrade_target {
            if let Some(upgraded) = self.try_upgrade(target, record).await? {
                return Ok(UpsertOutcome::Upgraded(upgraded));
            }
            tracing::warn!(
                record_id = %target,
                "Upgrade target is no longer a standalone translation, inserting instead"
            );
        }

        let inserted = self.insert(record).await?;
        Ok(UpsertOutcome::Inserted(inserted))
    }

    async fn save_standalone_translation(
        &self,
        translation: NewTranslation,
    ) -> Result<NarrationRecord, RepositoryError> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            INSERT INTO narration_records
                (id, original_text, translated_text, language_flag, content_key, source_url, created_at)
            VALUES ($1, $2, $3, TRUE, $4, $5, $6)
            RETURNING {RECORD_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&translation.original_text)
        .bind(&translation.translated_text)
        .bind(translation.content_key())
        .bind(&translation.source_url)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NarrationRecord>, RepositoryError> {
        let pool = self.pool.as_ref();
        let record = sqlx::query_as::<_, NarrationRecord>(&format!(
            "SELECT {RECORD_COLUMNS} FROM narration_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    async fn fetch_audio(&self, id: Uuid) -> Result<Option<Vec<u8>>, RepositoryError> {
        let pool = self.pool.as_ref();
        let audio: Option<Option<Vec<u8>>> =
            sqlx::query_scalar("SELECT audio_data FROM narration_records WHERE id = $1")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(audio.flatten())
    }

    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NarrationRecord>, RepositoryError> {
        let pool = self.pool.as_ref();
        let records = sqlx::query_as::<_, NarrationRecord>(&format!(
            r#"
            SELECT {RECORD_COLUMNS}
            FROM narration_records
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(records)
    }

    async fn list_summaries(&self) -> Result<Vec<RecordSummary>, RepositoryError> {
        let pool = self.pool.as_ref();
        let summaries = sqlx::query_as::<_, RecordSummary>(
            r#"
            SELECT id, original_text, translated_text, audio_present, content_key, created_at
            FROM narration_records
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(summaries)
    }

    async fn set_content_key(&self, id: Uuid, content_key: &str) -> Result<(), RepositoryError> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("UPDATE narration_records SET content_key = $1 WHERE id = $2")
            .bind(content_key)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM narration_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let pool = self.pool.as_ref();
        let (total, with_audio, translated, standalone_translations): (i64, i64, i64, i64) =
            sqlx::query_as(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE audio_present),
                    COUNT(*) FILTER (WHERE language_flag),
                    COUNT(*) FILTER (WHERE NOT audio_present AND translated_text IS NOT NULL)
                FROM narration_records
                "#,
            )
            .fetch_one(pool)
            .await?;

        let by_voice: Vec<(String, i64)> = sqlx::query_as(
            "SELECT voice, COUNT(*) FROM narration_records WHERE voice IS NOT NULL GROUP BY voice",
        )
        .fetch_all(pool)
        .await?;

        let by_tone: Vec<(String, i64)> = sqlx::query_as(
            "SELECT tone, COUNT(*) FROM narration_records WHERE tone IS NOT NULL GROUP BY tone",
        )
        .fetch_all(pool)
        .await?;

        Ok(StoreStats {
            total,
            with_audio,
            translated,
            standalone_translations,
            by_voice: by_voice.into_iter().collect(),
            by_tone: by_tone.into_iter().collect(),
        })
    }
}
