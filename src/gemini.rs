use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use crate::config::GeminiConfig;
use crate::error::{BotError, Result};
use crate::tools::{Tool, get_tool_definitions};
use crate::types::{Content, GenerateContentResponse};

/// A generative model that continues a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Sends the whole conversation so far and returns the model's next turn.
    async fn generate_content(&self, contents: Vec<Content>) -> Result<GenerateContentResponse>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content>,
    tools: &'a [Tool],
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct GenerationConfig {
    temperature: f64,
}

/// Gemini on Vertex AI, called over REST.
pub struct GeminiClient {
    access_token: String,
    client: reqwest::Client,
    url: String,
    temperature: f64,
    tools: Vec<Tool>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            access_token: config.access_token.clone(),
            client,
            url: config.generate_content_url(),
            temperature: config.temperature,
            tools: get_tool_definitions(),
        })
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_content(&self, contents: Vec<Content>) -> Result<GenerateContentResponse> {
        debug!("Sending request to Gemini API with {} contents", contents.len());

        let request = GenerateContentRequest {
            contents,
            tools: &self.tools,
            generation_config: GenerationConfig {
                temperature: self.temperature,
            },
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.access_token)
            .json(&request)
            .send()
            .await
            .map_err(model_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {e}"));
            return Err(BotError::ModelApi { status, message });
        }

        let api_response: GenerateContentResponse = response.json().await.map_err(model_error)?;
        debug!(
            "Received {} candidates from Gemini API",
            api_response.candidates.len()
        );
        Ok(api_response)
    }
}

fn model_error(err: reqwest::Error) -> BotError {
    if err.is_timeout() {
        BotError::Timeout("Gemini request")
    } else {
        BotError::ModelCall(err)
    }
}
