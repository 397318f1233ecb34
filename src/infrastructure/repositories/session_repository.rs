use super::narration_repository::RepositoryError;
use crate::domain::session::{ChunkReport, Session};
use async_trait::async_trait;
use uuid::Uuid;

/// Storage for narration sessions, keyed by session id.
///
/// Expired sessions behave as if they did not exist.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError>;

    async fn find(&self, id: Uuid) -> Result<Option<Session>, RepositoryError>;

    /// Append `report` and advance the cursor, but only if the cursor is still
    /// at `expected_index`. Returns false when another caller got there first,
    /// and `RepositoryError::NotFound` when the session is gone or expired.
    async fn commit_chunk(
        &self,
        id: Uuid,
        expected_index: usize,
        report: ChunkReport,
    ) -> Result<bool, RepositoryError>;

    /// Drop expired sessions, returning how many were removed
    async fn purge_expired(&self) -> Result<u64, RepositoryError>;
}
