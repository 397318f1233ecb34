use super::error::SessionServiceError;
use super::model::{ChunkReport, NextChunk, Session, SessionOptions, SessionStarted};
use crate::domain::narration::{
    Artifact, ChunkPlanner, ChunkRequest, NarrationServiceApi,
};
use crate::infrastructure::repositories::SessionRepository;
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    narration: Arc<dyn NarrationServiceApi>,
    planner: Arc<ChunkPlanner>,
    ttl: chrono::Duration,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        narration: Arc<dyn NarrationServiceApi>,
        planner: Arc<ChunkPlanner>,
        ttl: chrono::Duration,
    ) -> Self {
        Self {
            sessions,
            narration,
            planner,
            ttl,
        }
    }
}

#[async_trait]
pub trait SessionServiceApi: Send + Sync {
    /// Plan `text` into chunks and store a session positioned at the first one
    async fn start(
        &self,
        text: &str,
        options: SessionOptions,
    ) -> Result<SessionStarted, SessionServiceError>;

    /// Narrate the chunk under the cursor and advance the cursor.
    ///
    /// A chunk that fails is reported as failed and the cursor still moves on.
    async fn process_next(&self, session_id: Uuid) -> Result<NextChunk, SessionServiceError>;

    /// Reports for every chunk processed so far, in order
    async fn processed(&self, session_id: Uuid) -> Result<Vec<ChunkReport>, SessionServiceError>;

    /// Remove expired sessions from the store
    async fn purge_expired(&self) -> Result<u64, SessionServiceError>;
}

#[async_trait]
impl SessionServiceApi for SessionService {
    async fn start(
        &self,
        text: &str,
        options: SessionOptions,
    ) -> Result<SessionStarted, SessionServiceError> {
        let chunks = match options.max_chunk_length {
            Some(budget) => self.planner.plan_within(text, budget)?,
            None => self.planner.plan(text),
        };
        if chunks.iter().all(|c| c.trim().is_empty()) {
            return Err(SessionServiceError::Invalid(
                "text contains nothing to narrate".to_string(),
            ));
        }

        let session = Session::new(chunks, options, self.ttl);
        self.sessions.create(&session).await?;

        tracing::info!(
            session_id = %session.id,
            total_chunks = session.total_chunks(),
            text_length = text.len(),
            "Narration session started"
        );

        Ok(SessionStarted {
            session_id: session.id,
            total_chunks: session.total_chunks(),
            chunks: session.chunks,
            expires_at: session.expires_at,
        })
    }

    async fn process_next(&self, session_id: Uuid) -> Result<NextChunk, SessionServiceError> {
        let session = self.find_session(session_id).await?;

        let index = session.next_index;
        let chunk_text = session
            .next_chunk()
            .ok_or(SessionServiceError::SessionExhausted(session_id))?
            .to_string();
        let total_chunks = session.total_chunks();

        let request = ChunkRequest {
            text: chunk_text.clone(),
            voice: session.voice,
            tone: session.tone,
            translate: session.translate,
            source_url: session.source_url.clone(),
        };

        let (report, transient_audio) = match self.narration.process_chunk(request).await {
            Ok(outcome) => {
                let report = ChunkReport::done(index, &outcome);
                let transient_audio = match outcome.artifact {
                    Artifact::Transient { audio_data, .. } => Some(audio_data),
                    Artifact::Stored { .. } => None,
                };
                (report, transient_audio)
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session_id,
                    chunk_index = index,
                    stage = ?e.stage(),
                    error = %e,
                    "Chunk failed, advancing past it"
                );
                (ChunkReport::failed(index, &chunk_text, &e), None)
            }
        };

        let committed = self
            .sessions
            .commit_chunk(session_id, index, report.clone())
            .await?;

        if !committed {
            tracing::warn!(
                session_id = %session_id,
                chunk_index = index,
                "Session cursor moved while chunk was processed"
            );
            return Err(SessionServiceError::SessionConflict(session_id));
        }

        tracing::info!(
            session_id = %session_id,
            chunk_index = index,
            total_chunks = total_chunks,
            succeeded = report.is_done(),
            "Session advanced"
        );

        Ok(NextChunk {
            index,
            total_chunks,
            is_last: index + 1 == total_chunks,
            report,
            transient_audio,
        })
    }

    async fn processed(&self, session_id: Uuid) -> Result<Vec<ChunkReport>, SessionServiceError> {
        let session = self.find_session(session_id).await?;
        Ok(session.reports)
    }

    async fn purge_expired(&self) -> Result<u64, SessionServiceError> {
        let removed = self.sessions.purge_expired().await?;
        if removed > 0 {
            tracing::info!(removed = removed, "Expired sessions purged");
        }
        Ok(removed)
    }
}

impl SessionService {
    async fn find_session(&self, session_id: Uuid) -> Result<Session, SessionServiceError> {
        self.sessions
            .find(session_id)
            .await?
            .filter(|s| !s.is_expired())
            .ok_or(SessionServiceError::SessionNotFound(session_id))
    }
}
