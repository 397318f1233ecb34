//! Length-bounded text chunking.
//!
//! Text is cut at sentence boundaries and packed greedily so that every chunk
//! fits the narration provider's per-request budget. A sentence longer than the
//! budget is broken at spaces; a single word longer than the budget is the only
//! thing allowed to exceed it.

use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::length::LengthEstimator;

/// Default per-chunk budget, in estimator units
pub const DEFAULT_CHUNK_BUDGET: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkingError {
    #[error("chunk budget must be greater than zero")]
    InvalidBudget,
}

/// Planner bound to an estimator and a budget
#[derive(Clone)]
pub struct ChunkPlanner {
    estimator: Arc<dyn LengthEstimator>,
    budget: usize,
}

impl ChunkPlanner {
    pub fn new(estimator: Arc<dyn LengthEstimator>, budget: usize) -> Result<Self, ChunkingError> {
        if budget == 0 {
            return Err(ChunkingError::InvalidBudget);
        }
        Ok(Self { estimator, budget })
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Plan with a one-off budget instead of the planner's own
    pub fn plan_within(&self, text: &str, budget: usize) -> Result<Vec<String>, ChunkingError> {
        plan(text, budget, self.estimator.as_ref())
    }

    pub fn plan(&self, text: &str) -> Vec<String> {
        plan_with(text, self.budget, self.estimator.as_ref())
    }
}

/// Split `text` into ordered chunks of at most `budget` units each
pub fn plan(
    text: &str,
    budget: usize,
    estimator: &dyn LengthEstimator,
) -> Result<Vec<String>, ChunkingError> {
    if budget == 0 {
        return Err(ChunkingError::InvalidBudget);
    }
    Ok(plan_with(text, budget, estimator))
}

fn plan_with(text: &str, budget: usize, estimator: &dyn LengthEstimator) -> Vec<String> {
    let total = estimator.estimate(text);
    if total <= budget {
        tracing::debug!(total_length = total, budget, "Text fits in a single chunk");
        return vec![text.to_string()];
    }

    let sentences = split_sentences(text);
    tracing::debug!(
        total_length = total,
        budget,
        sentence_count = sentences.len(),
        "Splitting text into chunks"
    );

    let mut packer = Packer::new(budget, estimator);
    for sentence in sentences {
        if estimator.estimate(sentence) > budget {
            packer.flush();
            packer.push_words(sentence);
        } else {
            packer.push_sentence(sentence);
        }
    }
    let chunks = packer.finish();

    for (index, chunk) in chunks.iter().enumerate() {
        tracing::debug!(
            chunk_index = index,
            chunk_count = chunks.len(),
            chunk_length = estimator.estimate(chunk),
            "Planned chunk"
        );
    }

    chunks
}

fn sentence_boundary() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[.!?]\s+").expect("sentence pattern is valid"))
}

/// Sentences end at `.`, `!` or `?` followed by whitespace; the punctuation
/// stays with its sentence and the whitespace is dropped.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut last_end = 0;

    for mat in sentence_boundary().find_iter(text) {
        // punctuation is a single ASCII byte
        sentences.push(text[last_end..mat.start() + 1].trim());
        last_end = mat.end();
    }
    sentences.push(text[last_end..].trim());

    sentences.retain(|s| !s.is_empty());
    sentences
}

struct Packer<'a> {
    budget: usize,
    estimator: &'a dyn LengthEstimator,
    chunks: Vec<String>,
    current: String,
}

impl<'a> Packer<'a> {
    fn new(budget: usize, estimator: &'a dyn LengthEstimator) -> Self {
        Self {
            budget,
            estimator,
            chunks: Vec::new(),
            current: String::new(),
        }
    }

    fn joined(&self, next: &str) -> String {
        if self.current.is_empty() {
            next.to_string()
        } else {
            format!("{} {}", self.current, next)
        }
    }

    fn push_sentence(&mut self, sentence: &str) {
        let candidate = self.joined(sentence);
        if self.estimator.estimate(&candidate) <= self.budget {
            self.current = candidate;
        } else {
            self.flush();
            self.current = sentence.to_string();
        }
    }

    /// Pack the words of an oversized sentence; the last partial piece stays
    /// open so following sentences can join it.
    fn push_words(&mut self, sentence: &str) {
        for word in sentence.split(' ').filter(|w| !w.is_empty()) {
            let candidate = self.joined(word);
            if self.current.is_empty() || self.estimator.estimate(&candidate) <= self.budget {
                self.current = candidate;
            } else {
                self.flush();
                self.current = word.to_string();
            }
        }
    }

    fn flush(&mut self) {
        let chunk = self.current.trim();
        if !chunk.is_empty() {
            self.chunks.push(chunk.to_string());
        }
        self.current.clear();
    }

    fn finish(mut self) -> Vec<String> {
        self.flush();
        self.chunks
    }
}
