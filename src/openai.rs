use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::{AppConfig, API_KEY_VAR};
use crate::error::{Result, TaipoError};

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    error_type: Option<String>,
    message: String,
}

/// One completion request, sent exactly once. Implementations must not retry;
/// a failed or timed-out call is reported to the caller as is.
#[allow(async_fn_in_trait)]
pub trait SuggestionProvider {
    async fn complete(&self, messages: &[ChatMessage], timeout: Duration) -> Result<String>;
}

pub struct OpenAIClient {
    client: Client,
    config: AppConfig,
    api_key: Option<String>,
}

impl OpenAIClient {
    pub fn new(config: &AppConfig, api_key: Option<String>) -> Result<Self> {
        let client = ClientBuilder::new()
            .build()
            .map_err(|e| TaipoError::SystemError {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            config: config.clone(),
            api_key,
        })
    }

    async fn make_request(&self, api_key: &str, request: &ChatRequest, timeout: Duration) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.openai_base_url);

        let response = self.client
            .post(&url)
            .timeout(timeout)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ErrorResponse>(&response_text) {
                Ok(error_response) => format!(
                    "{} ({}): {}",
                    status,
                    error_response.error.error_type.as_deref().unwrap_or("error"),
                    error_response.error.message
                ),
                Err(_) => format!("HTTP {}: {}", status, response_text.trim()),
            };
            return Err(TaipoError::ApiError { message, source: None });
        }

        let chat_response: ChatResponse = serde_json::from_str(&response_text)
            .map_err(|e| TaipoError::ApiError {
                message: format!("Unexpected response shape: {}", e),
                source: Some(Box::new(e)),
            })?;

        // No choices is treated like an empty answer, not a failure
        let content = chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .unwrap_or_default();

        log::debug!("Raw OpenAI response: {}", content);
        Ok(content)
    }
}

impl SuggestionProvider for OpenAIClient {
    async fn complete(&self, messages: &[ChatMessage], timeout: Duration) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| TaipoError::CredentialError {
            message: format!("Please set {} in your environment.", API_KEY_VAR),
        })?;

        let request = ChatRequest {
            model: self.config.openai_model.clone(),
            messages: messages.to_vec(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        self.make_request(api_key, &request, timeout).await
    }
}
