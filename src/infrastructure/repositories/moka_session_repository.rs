use super::narration_repository::RepositoryError;
use super::session_repository::SessionRepository;
use crate::domain::session::{ChunkReport, Session};
use async_trait::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

const MAX_SESSIONS: u64 = 10_000;

/// In-process sessions with time-to-live eviction
pub struct MokaSessionRepository {
    sessions: Cache<Uuid, Arc<Mutex<Session>>>,
}

impl MokaSessionRepository {
    pub fn new(ttl: Duration) -> Self {
        let sessions = Cache::builder()
            .max_capacity(MAX_SESSIONS)
            .time_to_live(ttl)
            .build();

        Self { sessions }
    }
}

#[async_trait]
impl SessionRepository for MokaSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        self.sessions
            .insert(session.id, Arc::new(Mutex::new(session.clone())))
            .await;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>, RepositoryError> {
        let Some(entry) = self.sessions.get(&id).await else {
            return Ok(None);
        };
        let session = entry.lock().await.clone();

        if session.is_expired() {
            self.sessions.invalidate(&id).await;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn commit_chunk(
        &self,
        id: Uuid,
        expected_index: usize,
        report: ChunkReport,
    ) -> Result<bool, RepositoryError> {
        let Some(entry) = self.sessions.get(&id).await else {
            return Err(RepositoryError::NotFound(id));
        };
        let mut session = entry.lock().await;

        if session.is_expired() {
            return Err(RepositoryError::NotFound(id));
        }
        if session.next_index != expected_index {
            return Ok(false);
        }
        session.reports.push(report);
        session.next_index += 1;
        Ok(true)
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let entries: Vec<(Arc<Uuid>, Arc<Mutex<Session>>)> = self.sessions.iter().collect();
        let mut expired = Vec::new();
        for (id, entry) in entries {
            if entry.lock().await.is_expired() {
                expired.push(*id);
            }
        }
        for id in &expired {
            self.sessions.invalidate(id).await;
        }
        self.sessions.run_pending_tasks().await;
        Ok(expired.len() as u64)
    }
}
