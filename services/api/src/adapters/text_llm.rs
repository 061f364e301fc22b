//! services/api/src/adapters/text_llm.rs
//!
//! This module contains the adapter for the text-generation LLM.
//! It implements the `TextGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use async_trait::async_trait;
use job_tracker_core::ports::{PortError, PortResult, TextGenerationService};
use tracing::info;

const TEMPERATURE: f32 = 0.6;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn upstream(e: OpenAIError) -> PortError {
    PortError::ServiceUnavailable(format!("AI Service Error: {}", e))
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiTextAdapter {
    /// Sends the prompt as a single user message and returns the first choice.
    async fn generate_text(&self, prompt: &str, max_tokens: u32) -> PortResult<String> {
        let messages = vec![ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(upstream)?
            .into()];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .max_completion_tokens(max_tokens)
            .temperature(TEMPERATURE)
            .n(1)
            .build()
            .map_err(upstream)?;

        let response = self.client.chat().create(request).await.map_err(upstream)?;
        info!(model = %self.model, "Text generation response received");

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::ServiceUnavailable(
                    "AI Service Error: received an invalid or empty response".to_string(),
                )
            })
    }
}

/// Stands in when no API key is configured, so the AI endpoints fail cleanly.
#[derive(Clone, Default)]
pub struct UnconfiguredTextGenerator;

#[async_trait]
impl TextGenerationService for UnconfiguredTextGenerator {
    async fn generate_text(&self, _prompt: &str, _max_tokens: u32) -> PortResult<String> {
        Err(PortError::ServiceUnavailable(
            "AI service is not available. Check API key configuration.".to_string(),
        ))
    }
}
