use crate::error::AppError;
use std::sync::Arc;
use tiktoken_rs::CoreBPE;

/// Measures text in the narration provider's native length units
pub trait LengthEstimator: Send + Sync {
    fn estimate(&self, text: &str) -> usize;
}

/// BPE token count for an OpenAI model
pub struct TiktokenEstimator {
    bpe: Arc<CoreBPE>,
}

impl TiktokenEstimator {
    pub fn for_model(model: &str) -> Result<Self, AppError> {
        let bpe = tiktoken_rs::get_bpe_from_model(model).map_err(|e| {
            AppError::Config(format!("no tokenizer for model {}: {}", model, e))
        })?;

        Ok(Self { bpe: Arc::new(bpe) })
    }
}

impl LengthEstimator for TiktokenEstimator {
    fn estimate(&self, text: &str) -> usize {
        self.bpe.encode_with_special_tokens(text).len()
    }
}

/// Unicode scalar count
#[derive(Debug, Default, Clone, Copy)]
pub struct CharEstimator;

impl LengthEstimator for CharEstimator {
    fn estimate(&self, text: &str) -> usize {
        text.chars().count()
    }
}
