use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::{ChatMessage, StructuredOutputFormat};
use serde_json::{json, Value};
use thiserror::Error;

use fortune_core::LlmSettings;

use crate::prompt::{self, SCHEMA_NAME};

/// Why the generation capability produced no text. Every variant sends the
/// request down the local fallback path.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation not configured: {0}")]
    NotConfigured(String),
    #[error("generation unreachable: {0}")]
    Unreachable(String),
    #[error("generation returned no text")]
    EmptyOutput,
}

/// "Produce text given a prompt and a schema." Returned text is not
/// validated here.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError>;
}

fn map_backend(provider: &str) -> Result<LLMBackend, GenerationError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(GenerationError::NotConfigured(format!(
            "unknown provider: {other}"
        ))),
    }
}

/// Generator backed by a hosted model through the `llm` crate.
#[derive(Debug, Clone)]
pub struct LlmGenerator {
    settings: LlmSettings,
}

impl LlmGenerator {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

fn output_format(schema: &Value) -> Result<StructuredOutputFormat, GenerationError> {
    serde_json::from_value(json!({
        "name": SCHEMA_NAME,
        "schema": schema,
        "strict": true,
    }))
    .map_err(|e| GenerationError::NotConfigured(format!("schema: {e}")))
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn generate(&self, prompt: &str, schema: &Value) -> Result<String, GenerationError> {
        let settings = &self.settings;
        if !settings.is_configured() {
            return Err(GenerationError::NotConfigured(format!(
                "missing credential for {}",
                settings.provider
            )));
        }
        let backend = map_backend(&settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&settings.model)
            .system(prompt::system_prompt())
            .schema(output_format(schema)?);

        if !settings.api_key.is_empty() {
            builder = builder.api_key(&settings.api_key);
        }

        let llm = builder
            .build()
            .map_err(|e| GenerationError::NotConfigured(format!("build LLM: {e}")))?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        let response = llm
            .chat(&messages)
            .await
            .map_err(|e| GenerationError::Unreachable(format!("chat: {e}")))?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(GenerationError::EmptyOutput),
        }
    }
}
