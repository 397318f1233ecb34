use super::speech_repository::{SpeechRepository, SynthesisError};
use crate::domain::narration::Voice;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Default timeout for a single speech request
const DEFAULT_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    instructions: &'a str,
    response_format: &'a str,
}

/// OpenAI `/audio/speech` implementation of the speech repository.
///
/// Talks to the endpoint directly so the tone directive can be sent as
/// `instructions`, which the typed SDK request does not carry.
pub struct OpenAiSpeechRepository {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiSpeechRepository {
    pub fn new(api_key: String, base_url: String, model: String) -> Result<Self, SynthesisError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| SynthesisError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/speech", self.base_url)
    }
}

#[async_trait]
impl SpeechRepository for OpenAiSpeechRepository {
    async fn synthesize(
        &self,
        text: &str,
        voice: Voice,
        instruction: &str,
    ) -> Result<Vec<u8>, SynthesisError> {
        let start_time = std::time::Instant::now();

        tracing::info!(
            model = %self.model,
            voice = %voice,
            text_length = text.len(),
            "Calling OpenAI speech API"
        );

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: voice.as_str(),
            instructions: instruction,
            response_format: "mp3",
        };

        let response = self
            .http_client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    model = %self.model,
                    voice = %voice,
                    "OpenAI speech request failed"
                );
                SynthesisError(format!("OpenAI speech request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::error!(
                status = status.as_u16(),
                error = %error_text,
                "OpenAI speech API returned an error"
            );
            return Err(SynthesisError(format!(
                "OpenAI speech API error ({}): {}",
                status, error_text
            )));
        }

        // Buffer the whole body; a truncated stream surfaces as an error here
        let audio_bytes = response
            .bytes()
            .await
            .map_err(|e| SynthesisError(format!("Failed to read audio body: {}", e)))?
            .to_vec();

        if audio_bytes.is_empty() {
            return Err(SynthesisError("OpenAI speech API returned no audio".to_string()));
        }

        tracing::info!(
            provider = "openai",
            model = %self.model,
            voice = %voice,
            latency_ms = start_time.elapsed().as_millis(),
            characters_count = text.len(),
            audio_size_bytes = audio_bytes.len(),
            "Speech synthesis completed"
        );

        Ok(audio_bytes)
    }
}
