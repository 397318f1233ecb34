use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

use super::fingerprint::{content_key, StrictKey, TranslationKey};

/// Narration voice profiles offered by the speech provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Voice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl Voice {
    pub const ALL: [Voice; 6] = [
        Voice::Alloy,
        Voice::Echo,
        Voice::Fable,
        Voice::Onyx,
        Voice::Nova,
        Voice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Voice::Alloy => "alloy",
            Voice::Echo => "echo",
            Voice::Fable => "fable",
            Voice::Onyx => "onyx",
            Voice::Nova => "nova",
            Voice::Shimmer => "shimmer",
        }
    }
}

impl Default for Voice {
    fn default() -> Self {
        Voice::Nova
    }
}

impl std::fmt::Display for Voice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Voice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voice::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown voice '{}'", s))
    }
}

/// Narration tone, turned into a natural-language directive for the speech provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Neutral,
    Warm,
    Professional,
    Enthusiastic,
    Calm,
    Formal,
    Informal,
    Serious,
    Friendly,
}

impl Tone {
    pub const ALL: [Tone; 9] = [
        Tone::Neutral,
        Tone::Warm,
        Tone::Professional,
        Tone::Enthusiastic,
        Tone::Calm,
        Tone::Formal,
        Tone::Informal,
        Tone::Serious,
        Tone::Friendly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Neutral => "neutral",
            Tone::Warm => "warm",
            Tone::Professional => "professional",
            Tone::Enthusiastic => "enthusiastic",
            Tone::Calm => "calm",
            Tone::Formal => "formal",
            Tone::Informal => "informal",
            Tone::Serious => "serious",
            Tone::Friendly => "friendly",
        }
    }

    /// Speaking directive sent alongside the text
    pub fn instruction(&self) -> &'static str {
        match self {
            Tone::Neutral => "Speak in a neutral, balanced tone, with moderate pacing and no particular emotion.",
            Tone::Warm => "Speak in a warm, friendly, and approachable manner, with a gentle pace and welcoming tone.",
            Tone::Professional => "Speak in a professional, clear, and authoritative manner with confident pacing.",
            Tone::Enthusiastic => "Speak with high energy, excitement, and enthusiasm, with dynamic pacing and expressive intonation.",
            Tone::Calm => "Speak in a calm, soothing, and relaxed manner, with slower pacing and gentle intonation.",
            Tone::Formal => "Speak in a formal, proper, and ceremonial manner, with measured pacing and dignified tone.",
            Tone::Informal => "Speak in a casual, relaxed, and conversational manner, with natural pacing and everyday language.",
            Tone::Serious => "Speak in a serious, thoughtful, and contemplative manner, with deliberate pacing and minimal emotion.",
            Tone::Friendly => "Speak in a friendly, personable, and engaging manner, with conversational pacing and a touch of warmth.",
        }
    }
}

impl Default for Tone {
    fn default() -> Self {
        Tone::Neutral
    }
}

impl std::fmt::Display for Tone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown tone '{}'", s))
    }
}

/// A persisted narration unit, without its audio payload.
///
/// `voice` and `tone` are only set once audio exists. A record with
/// `translated_text` but no audio is a standalone translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NarrationRecord {
    pub id: Uuid,
    pub original_text: String,
    pub translated_text: Option<String>,
    pub language_flag: bool,
    pub voice: Option<Voice>,
    pub tone: Option<Tone>,
    pub audio_present: bool,
    pub content_key: String,
    pub source_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl NarrationRecord {
    pub fn is_standalone_translation(&self) -> bool {
        !self.audio_present && self.translated_text.is_some()
    }

    pub fn matches_strict(&self, key: &StrictKey) -> bool {
        self.audio_present
            && self.original_text == key.original_text
            && self.language_flag == key.language_flag
            && self.voice == Some(key.voice)
            && self.tone == Some(key.tone)
    }

    pub fn matches_translation(&self, key: &TranslationKey) -> bool {
        self.is_standalone_translation()
            && self.original_text == key.original_text
            && self.language_flag == key.language_flag
    }
}

/// A complete record about to be written: audio is fully buffered before this exists.
#[derive(Debug, Clone)]
pub struct NewRecord {
    pub original_text: String,
    pub translated_text: Option<String>,
    pub language_flag: bool,
    pub voice: Voice,
    pub tone: Tone,
    pub audio_data: Vec<u8>,
    pub source_url: Option<String>,
}

impl NewRecord {
    pub fn content_key(&self) -> String {
        content_key(&self.original_text, self.translated_text.as_deref())
    }
}

/// A translation recorded without audio
#[derive(Debug, Clone)]
pub struct NewTranslation {
    pub original_text: String,
    pub translated_text: String,
    pub source_url: Option<String>,
}

impl NewTranslation {
    pub fn content_key(&self) -> String {
        content_key(&self.original_text, Some(&self.translated_text))
    }
}

/// Result of an `upsert_with_audio` call
#[derive(Debug, Clone)]
pub enum UpsertOutcome {
    /// A standalone translation was completed in place
    Upgraded(NarrationRecord),
    /// A new record was created
    Inserted(NarrationRecord),
}

impl UpsertOutcome {
    pub fn record(&self) -> &NarrationRecord {
        match self {
            UpsertOutcome::Upgraded(record) | UpsertOutcome::Inserted(record) => record,
        }
    }

    pub fn into_record(self) -> NarrationRecord {
        match self {
            UpsertOutcome::Upgraded(record) | UpsertOutcome::Inserted(record) => record,
        }
    }
}

/// One chunk to narrate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRequest {
    pub text: String,
    #[serde(default)]
    pub voice: Voice,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub translate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

/// Where the audio of a chunk is available
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Artifact {
    /// Audio is stored under this record id
    Stored { record_id: Uuid },
    /// Caching failed; audio is only held in memory
    Transient {
        record_id: Uuid,
        #[serde(skip)]
        audio_data: Vec<u8>,
    },
}

impl Artifact {
    pub fn reference(&self) -> Uuid {
        match self {
            Artifact::Stored { record_id } | Artifact::Transient { record_id, .. } => *record_id,
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Artifact::Stored { .. })
    }
}

/// How the audio for a chunk was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    CacheHit,
    Upgraded,
    Synthesized,
}

/// Successful result of processing one chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkOutcome {
    pub chunk_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_text: Option<String>,
    pub artifact: Artifact,
    pub source: OutcomeSource,
}
