use super::narration_repository::RepositoryError;
use super::session_repository::SessionRepository;
use crate::domain::narration::{Tone, Voice};
use crate::domain::session::{ChunkReport, Session};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, FromRow)]
struct SessionRow {
    id: Uuid,
    title: Option<String>,
    chunks: Json<Vec<String>>,
    next_index: i32,
    voice: Voice,
    tone: Tone,
    translate: bool,
    source_url: Option<String>,
    reports: Json<Vec<ChunkReport>>,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            chunks: row.chunks.0,
            next_index: row.next_index.max(0) as usize,
            voice: row.voice,
            tone: row.tone,
            translate: row.translate,
            source_url: row.source_url,
            reports: row.reports.0,
            created_at: row.created_at,
            expires_at: row.expires_at,
        }
    }
}

/// Postgres-backed sessions, shared by every worker
pub struct PgSessionRepository {
    pool: Arc<DbPool>,
}

impl PgSessionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, session: &Session) -> Result<(), RepositoryError> {
        let pool = self.pool.as_ref();

        sqlx::query(
            r#"
            INSERT INTO narration_sessions
                (id, title, chunks, next_index, voice, tone, translate, source_url, reports, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id)
        .bind(&session.title)
        .bind(Json(&session.chunks))
        .bind(session.next_index as i32)
        .bind(session.voice)
        .bind(session.tone)
        .bind(session.translate)
        .bind(&session.source_url)
        .bind(Json(&session.reports))
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Session>, RepositoryError> {
        let pool = self.pool.as_ref();
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT id, title, chunks, next_index, voice, tone, translate, source_url, reports, created_at, expires_at
            FROM narration_sessions
            WHERE id = $1 AND expires_at > $2
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(Session::from))
    }

    async fn commit_chunk(
        &self,
        id: Uuid,
        expected_index: usize,
        report: ChunkReport,
    ) -> Result<bool, RepositoryError> {
        let pool = self.pool.as_ref();
        let result = sqlx::query(
            r#"
            UPDATE narration_sessions
            SET next_index = next_index + 1,
                reports = reports || jsonb_build_array($3::jsonb)
            WHERE id = $1 AND next_index = $2 AND expires_at > $4
            "#,
        )
        .bind(id)
        .bind(expected_index as i32)
        .bind(Json(&report))
        .bind(Utc::now())
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Tell a moved cursor apart from a session that is gone
        let live: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM narration_sessions WHERE id = $1 AND expires_at > $2)",
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_one(pool)
        .await?;

        if live {
            Ok(false)
        } else {
            Err(RepositoryError::NotFound(id))
        }
    }

    async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let pool = self.pool.as_ref();
        let result = sqlx::query("DELETE FROM narration_sessions WHERE expires_at <= $1")
            .bind(Utc::now())
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
