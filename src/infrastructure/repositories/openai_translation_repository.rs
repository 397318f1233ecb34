use super::translation_repository::{TranslationError, TranslationRepository};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

const TRANSLATION_TEMPERATURE: f32 = 0.3;

/// OpenAI chat-completions implementation of the translation repository
pub struct OpenAiTranslationRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiTranslationRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }

    fn build_messages(
        text: &str,
        target_language: &str,
    ) -> Result<Vec<ChatCompletionRequestMessage>, TranslationError> {
        Ok(vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(format!(
                    "You are a translator that translates text to {}. Preserve the meaning, tone, and style of the original text. Provide only the translation without explanations.",
                    target_language
                ))
                .build()
                .map_err(|e| TranslationError(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(format!(
                    "Translate the following text to {}:\n\n{}",
                    target_language, text
                ))
                .build()
                .map_err(|e| TranslationError(e.to_string()))?
                .into(),
        ])
    }
}

#[async_trait]
impl TranslationRepository for OpenAiTranslationRepository {
    async fn translate(&self, text: &str, target_language: &str) -> Result<String, TranslationError> {
        let start_time = std::time::Instant::now();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::build_messages(text, target_language)?)
            .temperature(TRANSLATION_TEMPERATURE)
            .build()
            .map_err(|e| TranslationError(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                text_length = text.len(),
                "OpenAI translation call failed"
            );
            TranslationError(format!("OpenAI translation error: {}", e))
        })?;

        let translated = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| TranslationError("Empty response from translation model".to_string()))?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            target_language = target_language,
            latency_ms = start_time.elapsed().as_millis(),
            source_length = text.len(),
            translated_length = translated.len(),
            "Translation completed"
        );

        Ok(translated)
    }
}
