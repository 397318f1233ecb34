use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::narration::{ChunkOutcome, OutcomeSource, Tone, Voice};

/// Default session lifetime
pub const DEFAULT_SESSION_TTL_SECS: i64 = 60 * 60;

/// A planned narration: the chunk list plus a cursor, resumable by id from any worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub title: Option<String>,
    pub chunks: Vec<String>,
    pub next_index: usize,
    pub voice: Voice,
    pub tone: Tone,
    pub translate: bool,
    pub source_url: Option<String>,
    pub reports: Vec<ChunkReport>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(chunks: Vec<String>, options: SessionOptions, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: options.title,
            chunks,
            next_index: 0,
            voice: options.voice,
            tone: options.tone,
            translate: options.translate,
            source_url: options.source_url,
            reports: Vec::new(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn total_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.next_index >= self.chunks.len()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn next_chunk(&self) -> Option<&str> {
        self.chunks.get(self.next_index).map(String::as_str)
    }
}

/// Narration settings fixed for the whole session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionOptions {
    #[serde(default)]
    pub voice: Voice,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub translate: bool,
    pub source_url: Option<String>,
    pub title: Option<String>,
    /// Overrides the planner's chunk budget for this session
    #[serde(default)]
    pub max_chunk_length: Option<usize>,
}

/// What happened to one chunk of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChunkReport {
    Done {
        index: usize,
        chunk_text: String,
        translated_text: Option<String>,
        record_id: Uuid,
        stored: bool,
        source: OutcomeSource,
    },
    Failed {
        index: usize,
        chunk_text: String,
        error: String,
    },
}

impl ChunkReport {
    pub fn done(index: usize, outcome: &ChunkOutcome) -> Self {
        ChunkReport::Done {
            index,
            chunk_text: outcome.chunk_text.clone(),
            translated_text: outcome.translated_text.clone(),
            record_id: outcome.artifact.reference(),
            stored: outcome.artifact.is_stored(),
            source: outcome.source,
        }
    }

    pub fn failed(index: usize, chunk_text: &str, error: impl ToString) -> Self {
        ChunkReport::Failed {
            index,
            chunk_text: chunk_text.to_string(),
            error: error.to_string(),
        }
    }

    pub fn index(&self) -> usize {
        match self {
            ChunkReport::Done { index, .. } | ChunkReport::Failed { index, .. } => *index,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, ChunkReport::Done { .. })
    }
}

/// Returned when a session is created
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStarted {
    pub session_id: Uuid,
    pub total_chunks: usize,
    pub chunks: Vec<String>,
    pub expires_at: DateTime<Utc>,
}

/// Result of advancing a session by one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextChunk {
    pub index: usize,
    pub total_chunks: usize,
    pub is_last: bool,
    pub report: ChunkReport,
    /// Audio held in memory when it could not be cached
    #[serde(skip)]
    pub transient_audio: Option<Vec<u8>>,
}
