use super::narration_repository::{NarrationRepository, RecordSummary, RepositoryError, StoreStats};
use crate::domain::narration::fingerprint::{StrictKey, TranslationKey};
use crate::domain::narration::{NarrationRecord, NewRecord, NewTranslation, UpsertOutcome};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

struct StoredRecord {
    record: NarrationRecord,
    audio_data: Option<Vec<u8>>,
}

/// Process-local narration cache, for single-node runs and tests
#[derive(Default)]
pub struct InMemoryNarrationRepository {
    records: RwLock<HashMap<Uuid, StoredRecord>>,
}

impl InMemoryNarrationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    /// All records, oldest first
    pub async fn snapshot(&self) -> Vec<NarrationRecord> {
        let records = self.records.read().await;
        let mut all: Vec<NarrationRecord> = records.values().map(|s| s.record.clone()).collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    /// Insert a fully formed record as-is, bypassing the online write rules
    pub async fn seed(&self, record: NarrationRecord, audio_data: Option<Vec<u8>>) {
        let mut record = record;
        record.audio_present = audio_data.is_some();
        self.records
            .write()
            .await
            .insert(record.id, StoredRecord { record, audio_data });
    }

    fn newest<'a>(
        records: impl Iterator<Item = &'a StoredRecord>,
    ) -> Option<NarrationRecord> {
        records
            .max_by(|a, b| a.record.created_at.cmp(&b.record.created_at))
            .map(|s| s.record.clone())
    }
}

#[async_trait]
impl NarrationRepository for InMemoryNarrationRepository {
    async fn find_complete(
        &self,
        key: &StrictKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(Self::newest(
            records.values().filter(|s| s.record.matches_strict(key)),
        ))
    }

    async fn find_standalone_translation(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        let records = self.records.read().await;
        Ok(Self::newest(
            records.values().filter(|s| s.record.matches_translation(key)),
        ))
    }

    async fn upsert_with_audio(
        &self,
        record: &NewRecord,
        upgrade_target: Option<Uuid>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        let mut records = self.records.write().await;
        let now = Utc::now();

        if let Some(target) = upgrade_target {
            match records.get_mut(&target) {
                Some(stored) if stored.record.is_standalone_translation() => {
                    stored.record.voice = Some(record.voice);
                    stored.record.tone = Some(record.tone);
                    stored.record.audio_present = true;
                    stored.record.updated_at = Some(now);
                    if stored.record.source_url.is_none() {
                        stored.record.source_url = record.source_url.clone();
                    }
                    stored.audio_data = Some(record.audio_data.clone());
                    return Ok(UpsertOutcome::Upgraded(stored.record.clone()));
                }
                _ => {
                    tracing::warn!(
                        record_id = %target,
                        "Upgrade target is no longer a standalone translation, inserting instead"
                    );
                }
            }
        }

        let inserted = NarrationRecord {
            id: Uuid::new_v4(),
            content_key: record.content_key(),
            original_text: record.original_text.clone(),
            translated_text: record.translated_text.clone(),
            language_flag: record.language_flag,
            voice: Some(record.voice),
            tone: Some(record.tone),
            audio_present: true,
            source_url: record.source_url.clone(),
            created_at: now,
            updated_at: None,
        };
        records.insert(
            inserted.id,
            StoredRecord {
                record: inserted.clone(),
                audio_data: Some(record.audio_data.clone()),
            },
        );

        Ok(UpsertOutcome::Inserted(inserted))
    }

    async fn save_standalone_translation(
        &self,
        translation: NewTranslation,
    ) -> Result<NarrationRecord, RepositoryError> {
        let record = NarrationRecord {
            id: Uuid::new_v4(),
            content_key: translation.content_key(),
            original_text: translation.original_text,
            translated_text: Some(translation.translated_text),
            language_flag: true,
            voice: None,
            tone: None,
            audio_present: false,
            source_url: translation.source_url,
            created_at: Utc::now(),
            updated_at: None,
        };
        self.records.write().await.insert(
            record.id,
            StoredRecord {
                record: record.clone(),
                audio_data: None,
            },
        );

        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NarrationRecord>, RepositoryError> {
        Ok(self.records.read().await.get(&id).map(|s| s.record.clone()))
    }

    async fn fetch_audio(&self, id: Uuid) -> Result<Option<Vec<u8>>, RepositoryError> {
        Ok(self
            .records
            .read()
            .await
            .get(&id)
            .and_then(|s| s.audio_data.clone()))
    }

    async fn list_recent(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NarrationRecord>, RepositoryError> {
        let mut all = self.snapshot().await;
        all.reverse();
        Ok(all
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_summaries(&self) -> Result<Vec<RecordSummary>, RepositoryError> {
        let records = self.records.read().await;
        Ok(records.values().map(|s| RecordSummary::from(&s.record)).collect())
    }

    async fn set_content_key(&self, id: Uuid, content_key: &str) -> Result<(), RepositoryError> {
        let mut records = self.records.write().await;
        let stored = records.get_mut(&id).ok_or(RepositoryError::NotFound(id))?;
        stored.record.content_key = content_key.to_string();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.records.write().await.remove(&id).is_some())
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        let records = self.records.read().await;
        let mut stats = StoreStats::default();

        for stored in records.values() {
            let record = &stored.record;
            stats.total += 1;
            if record.audio_present {
                stats.with_audio += 1;
            }
            if record.language_flag {
                stats.translated += 1;
            }
            if record.is_standalone_translation() {
                stats.standalone_translations += 1;
            }
            if let Some(voice) = record.voice {
                *stats.by_voice.entry(voice.to_string()).or_default() += 1;
            }
            if let Some(tone) = record.tone {
                *stats.by_tone.entry(tone.to_string()).or_default() += 1;
            }
        }

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::narration::{Tone, Voice};

    fn new_record(text: &str, translated: Option<&str>, voice: Voice, tone: Tone) -> NewRecord {
        NewRecord {
            original_text: text.to_string(),
            translated_text: translated.map(str::to_string),
            language_flag: translated.is_some(),
            voice,
            tone,
            audio_data: vec![0xFF, 0xFB],
            source_url: None,
        }
    }

    #[tokio::test]
    async fn test_insert_then_find_complete() {
        let repo = InMemoryNarrationRepository::new();
        let outcome = repo
            .upsert_with_audio(&new_record("Hi.", None, Voice::Nova, Tone::Calm), None)
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(_)));

        let key = StrictKey::new("Hi.", false, Voice::Nova, Tone::Calm);
        let found = repo.find_complete(&key).await.unwrap().unwrap();
        assert_eq!(found.id, outcome.record().id);

        let other_voice = StrictKey::new("Hi.", false, Voice::Onyx, Tone::Calm);
        assert!(repo.find_complete(&other_voice).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upgrade_keeps_identity() {
        let repo = InMemoryNarrationRepository::new();
        let standalone = repo
            .save_standalone_translation(NewTranslation {
                original_text: "Hi.".to_string(),
                translated_text: "你好。".to_string(),
                source_url: None,
            })
            .await
            .unwrap();

        let outcome = repo
            .upsert_with_audio(
                &new_record("Hi.", Some("你好。"), Voice::Echo, Tone::Warm),
                Some(standalone.id),
            )
            .await
            .unwrap();

        let upgraded = match outcome {
            UpsertOutcome::Upgraded(record) => record,
            other => panic!("expected upgrade, got {:?}", other),
        };
        assert_eq!(upgraded.id, standalone.id);
        assert!(upgraded.audio_present);
        assert_eq!(upgraded.voice, Some(Voice::Echo));
        assert!(upgraded.updated_at.is_some());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_complete_record_is_never_overwritten() {
        let repo = InMemoryNarrationRepository::new();
        let first = repo
            .upsert_with_audio(&new_record("Hi.", Some("你好。"), Voice::Nova, Tone::Calm), None)
            .await
            .unwrap()
            .into_record();

        let second = repo
            .upsert_with_audio(
                &new_record("Hi.", Some("你好。"), Voice::Onyx, Tone::Serious),
                Some(first.id),
            )
            .await
            .unwrap();

        assert!(matches!(second, UpsertOutcome::Inserted(_)));
        let untouched = repo.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(untouched.voice, Some(Voice::Nova));
        assert_eq!(untouched.updated_at, None);
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn test_stats_count_by_kind() {
        let repo = InMemoryNarrationRepository::new();
        repo.upsert_with_audio(&new_record("A.", None, Voice::Nova, Tone::Calm), None)
            .await
            .unwrap();
        repo.save_standalone_translation(NewTranslation {
            original_text: "B.".to_string(),
            translated_text: "乙。".to_string(),
            source_url: None,
        })
        .await
        .unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.with_audio, 1);
        assert_eq!(stats.translated, 1);
        assert_eq!(stats.standalone_translations, 1);
        assert_eq!(stats.by_voice.get("nova"), Some(&1));
    }
}
