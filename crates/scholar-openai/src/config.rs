//! OpenAI configuration

use scholar_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Configuration for the OpenAI client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
}

impl OpenAIConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_env_with_key(None)
    }

    /// Like `from_env`, with an explicit key taking precedence over `OPENAI_API_KEY`
    pub fn from_env_with_key(api_key: Option<String>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = match api_key {
            Some(key) => key,
            None => env::var("OPENAI_API_KEY").map_err(|_| {
                Error::Configuration("OPENAI_API_KEY environment variable not found".to_string())
            })?,
        };

        let mut config = Self::new(api_key);
        if let Ok(base_url) = env::var("OPENAI_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(model) = env::var("OPENAI_CHAT_MODEL") {
            config.chat_model = model;
        }
        if let Ok(model) = env::var("OPENAI_EMBEDDING_MODEL") {
            config.embedding_model = model;
        }

        config.validate()?;
        Ok(config)
    }

    /// Create configuration with an explicit API key and default models
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }

    /// Fail fast when the credential is missing
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::Configuration(
                "An OpenAI API key is required before any embedding or model call".to_string(),
            ));
        }
        Ok(())
    }
}
