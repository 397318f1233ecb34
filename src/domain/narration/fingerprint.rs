//! Cache keys for narration records.
//!
//! The strict key identifies a reusable audio artifact; the translation key
//! ignores voice and tone so a translation can be reused across voices.

use sha2::{Digest, Sha256};

use super::model::{Tone, Voice};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StrictKey {
    pub original_text: String,
    pub language_flag: bool,
    pub voice: Voice,
    pub tone: Tone,
}

impl StrictKey {
    pub fn new(original_text: &str, language_flag: bool, voice: Voice, tone: Tone) -> Self {
        Self {
            original_text: original_text.to_string(),
            language_flag,
            voice,
            tone,
        }
    }

    pub fn translation_key(&self) -> TranslationKey {
        TranslationKey {
            original_text: self.original_text.clone(),
            language_flag: self.language_flag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TranslationKey {
    pub original_text: String,
    pub language_flag: bool,
}

impl TranslationKey {
    pub fn new(original_text: &str, language_flag: bool) -> Self {
        Self {
            original_text: original_text.to_string(),
            language_flag,
        }
    }
}

/// Content fingerprint used by the offline duplicate cleanup
pub fn content_key(original_text: &str, translated_text: Option<&str>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(original_text.as_bytes());
    hasher.update(b"|");
    hasher.update(translated_text.unwrap_or("").as_bytes());
    format!("{:x}", hasher.finalize())
}
