#![allow(dead_code)]

use async_trait::async_trait;
use narrator_backend::domain::narration::fingerprint::{StrictKey, TranslationKey};
use narrator_backend::domain::narration::{
    NarrationRecord, NarrationService, NewRecord, NewTranslation, UpsertOutcome, Voice,
};
use narrator_backend::infrastructure::repositories::{
    InMemoryNarrationRepository, NarrationRepository, RecordSummary, RepositoryError,
    SpeechRepository, StoreStats, SynthesisError, TranslationError, TranslationRepository,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

pub const TARGET_LANGUAGE: &str = "Simplified Chinese";

/// Translator that prefixes the text and counts calls
#[derive(Default)]
pub struct CountingTranslator {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingTranslator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationRepository for CountingTranslator {
    async fn translate(&self, text: &str, _target_language: &str) -> Result<String, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(TranslationError("provider timeout".to_string()));
        }
        Ok(format!("[zh] {}", text))
    }
}

/// Synthesizer producing fake MP3 bytes from its input
#[derive(Default)]
pub struct CountingSynthesizer {
    calls: AtomicUsize,
    fail: AtomicBool,
    fail_marker: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    spoken: Mutex<Vec<(String, String)>>,
}

impl CountingSynthesizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Fail only for texts containing `marker`
    pub fn fail_when_contains(&self, marker: &str) {
        *self.fail_marker.lock() = Some(marker.to_string());
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// (text, instruction) pairs in call order
    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }
}

pub fn fake_audio(text: &str, voice: Voice) -> Vec<u8> {
    format!("mp3:{}:{}", voice, text).into_bytes()
}

#[async_trait]
impl SpeechRepository for CountingSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        instruction: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.spoken
            .lock()
            .push((text.to_string(), instruction.to_string()));

        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let marked = self
            .fail_marker
            .lock()
            .as_deref()
            .map(|marker| text.contains(marker))
            .unwrap_or(false);
        if marked || self.fail.load(Ordering::SeqCst) {
            return Err(SynthesisError("provider returned 500".to_string()));
        }
        Ok(fake_audio(text, voice))
    }
}

/// In-memory store whose reads or writes can be switched off
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryNarrationRepository,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), RepositoryError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::Persistence("disk full".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NarrationRepository for FlakyStore {
    async fn find_complete(&self, key: &StrictKey) -> Result<Option<NarrationRecord>, RepositoryError> {
        self.check_read()?;
        self.inner.find_complete(key).await
    }

    async fn find_standalone_translation(
        &self,
        key: &TranslationKey,
    ) -> Result<Option<NarrationRecord>, RepositoryError> {
        self.check_read()?;
        self.inner.find_standalone_translation(key).await
    }

    async fn upsert_with_audio(
        &self,
        record: &NewRecord,
        upgrade_target: Option<Uuid>,
    ) -> Result<UpsertOutcome, RepositoryError> {
        self.check_write()?;
        self.inner.upsert_with_audio(record, upgrade_target).await
    }

    async fn save_standalone_translation(
        &self,
        translation: NewTranslation,
    ) -> Result<NarrationRecord, RepositoryError> {
        self.check_write()?;
        self.inner.save_standalone_translation(translation).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<NarrationRecord>, RepositoryError> {
        self.check_read()?;
        self.inner.find_by_id(id).await
    }

    async fn fetch_audio(&self, id: Uuid) -> Result<Option<Vec<u8>>, RepositoryError> {
        self.check_read()?;
        self.inner.fetch_audio(id).await
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<NarrationRecord>, RepositoryError> {
        self.check_read()?;
        self.inner.list_recent(limit, offset).await
    }

    async fn list_summaries(&self) -> Result<Vec<RecordSummary>, RepositoryError> {
        self.check_read()?;
        self.inner.list_summaries().await
    }

    async fn set_content_key(&self, id: Uuid, content_key: &str) -> Result<(), RepositoryError> {
        self.check_write()?;
        self.inner.set_content_key(id, content_key).await
    }

    async fn delete(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.check_write()?;
        self.inner.delete(id).await
    }

    async fn stats(&self) -> Result<StoreStats, RepositoryError> {
        self.check_read()?;
        self.inner.stats().await
    }
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub translator: Arc<CountingTranslator>,
    pub synthesizer: Arc<CountingSynthesizer>,
    pub service: Arc<NarrationService>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(FlakyStore::default());
        let translator = Arc::new(CountingTranslator::default());
        let synthesizer = Arc::new(CountingSynthesizer::default());
        let service = Arc::new(NarrationService::new(
            store.clone(),
            translator.clone(),
            synthesizer.clone(),
            TARGET_LANGUAGE,
        ));

        Self {
            store,
            translator,
            synthesizer,
            service,
        }
    }
}
