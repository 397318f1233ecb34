use crate::domain::narration::{DEFAULT_CHUNK_BUDGET, DEFAULT_TARGET_LANGUAGE};
use crate::domain::session::DEFAULT_SESSION_TTL_SECS;
use crate::error::AppError;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: Option<String>,
    pub store_backend: StoreBackend,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub translation_model: String,
    pub speech_model: String,
    pub target_language: String,
    // Chunking
    pub length_units: LengthUnits,
    pub tokenizer_model: String,
    pub max_chunk_length: usize,
    // Sessions
    pub session_ttl_secs: i64,
    pub environment: Environment,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LengthUnits {
    Tokens,
    Chars,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let store_backend = match env_or("STORE_BACKEND", "postgres").to_lowercase().as_str() {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(AppError::Config(format!(
                    "STORE_BACKEND must be postgres or memory, got {}",
                    other
                )))
            }
        };

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(AppError::Config(
                "DATABASE_URL is required when STORE_BACKEND=postgres".to_string(),
            ));
        }

        let length_units = match env_or("LENGTH_UNITS", "tokens").to_lowercase().as_str() {
            "tokens" => LengthUnits::Tokens,
            "chars" => LengthUnits::Chars,
            other => {
                return Err(AppError::Config(format!(
                    "LENGTH_UNITS must be tokens or chars, got {}",
                    other
                )))
            }
        };

        let environment = match env_or("ENVIRONMENT", "development").as_str() {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let config = Config {
            database_url,
            store_backend,
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_base_url: env_or("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            translation_model: env_or("TRANSLATION_MODEL", "gpt-4o"),
            speech_model: env_or("SPEECH_MODEL", "gpt-4o-mini-tts"),
            target_language: env_or("TARGET_LANGUAGE", DEFAULT_TARGET_LANGUAGE),
            length_units,
            tokenizer_model: env_or("TOKENIZER_MODEL", "gpt-4o"),
            max_chunk_length: parse_env("MAX_CHUNK_LENGTH", DEFAULT_CHUNK_BUDGET)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
            log_format: match env::var("LOG_FORMAT").ok().as_deref() {
                Some("json") => LogFormat::Json,
                Some(_) => LogFormat::Pretty,
                // Production logs are shipped as JSON unless told otherwise
                None if environment == Environment::Production => LogFormat::Json,
                None => LogFormat::Pretty,
            },
            environment,
        };

        if config.max_chunk_length == 0 {
            return Err(AppError::Config(
                "MAX_CHUNK_LENGTH must be positive".to_string(),
            ));
        }
        if config.session_ttl_secs <= 0 {
            return Err(AppError::Config(
                "SESSION_TTL_SECS must be positive".to_string(),
            ));
        }

        Ok(config)
    }

    /// The OpenAI key, for commands that talk to OpenAI
    pub fn require_openai_api_key(&self) -> Result<&str, AppError> {
        self.openai_api_key.as_deref().ok_or_else(|| {
            AppError::Config("OPENAI_API_KEY is required for translation and speech".to_string())
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T: FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} is not a valid number: {}", key, raw))),
        Err(_) => Ok(default),
    }
}
