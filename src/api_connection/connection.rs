use async_trait::async_trait;
use dotenv::dotenv;
use reqwest::{Client, StatusCode};
use std::env;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{
    AnthropicTool, AnthropicToolChoice, ChatCompletionRequest, ChatCompletionResponse,
    ChatMessage, JsonSchemaDefinition, MessagesRequest, MessagesResponse, Provider,
    ResponseFormat, ANTHROPIC_URL, ANTHROPIC_VERSION, DEFAULT_ANTHROPIC_MODEL,
    DEFAULT_OPENROUTER_MODEL, OPENROUTER_URL,
};

const STRUCTURED_MAX_TOKENS: u32 = 8000;
const STRUCTURED_TEMPERATURE: f32 = 0.7;
const CHAT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Error)]
pub enum ApiConnectionError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("API error {status}: {error_body}")]
    ApiError {
        status: StatusCode,
        error_body: String,
    },
    #[error("model returned no content")]
    EmptyResponse,
    #[error("model did not call the `{0}` tool")]
    MissingToolOutput(String),
}

/// What the planner needs from a language model. `Provider` talks to the real
/// APIs; tests substitute a scripted implementation.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Free-form completion of a single user prompt.
    async fn complete_text(&self, prompt: &str, max_tokens: u32)
        -> Result<String, ApiConnectionError>;

    /// Completion constrained to `schema`, returned as parsed JSON.
    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &JsonSchemaDefinition,
    ) -> Result<serde_json::Value, ApiConnectionError>;
}

/// Removes a surrounding ```json ... ``` (or bare ```) fence, if any.
pub fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    if !(trimmed.starts_with("```") && trimmed.ends_with("```") && trimmed.len() >= 6) {
        return trimmed;
    }
    let inner = &trimmed[3..trimmed.len() - 3];
    inner.strip_prefix("json").unwrap_or(inner).trim()
}

impl Provider {
    pub fn openrouter(api_key_env_var_name: &str, model: Option<String>) -> Self {
        dotenv().ok();
        Self::OpenRouter {
            api_key: api_key_env_var_name.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_OPENROUTER_MODEL.to_string()),
        }
    }

    pub fn anthropic(api_key_env_var_name: &str, model: Option<String>) -> Self {
        dotenv().ok();
        Self::Anthropic {
            api_key: api_key_env_var_name.to_string(),
            model: model.unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Provider::OpenRouter { model, .. } | Provider::Anthropic { model, .. } => model,
        }
    }

    fn api_key(&self) -> Result<String, ApiConnectionError> {
        let name = match self {
            Provider::OpenRouter { api_key, .. } | Provider::Anthropic { api_key, .. } => api_key,
        };
        env::var(name).map_err(|_| ApiConnectionError::MissingApiKey(name.clone()))
    }

    pub async fn call_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ApiConnectionError> {
        let api_key = self.api_key()?;

        let site_url =
            env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "MealPlanner".to_string());

        let response = Client::new()
            .post(OPENROUTER_URL)
            .bearer_auth(api_key)
            .header("HTTP-Referer", site_url)
            .header("X-Title", app_name)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<ChatCompletionResponse>().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    pub async fn call_messages(
        &self,
        request: MessagesRequest,
    ) -> Result<MessagesResponse, ApiConnectionError> {
        let api_key = self.api_key()?;

        let response = Client::new()
            .post(ANTHROPIC_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json::<MessagesResponse>().await?)
        } else {
            Err(api_error(response).await)
        }
    }
}

async fn api_error(response: reqwest::Response) -> ApiConnectionError {
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error body".to_string());
    warn!(%status, "language model API returned an error");
    ApiConnectionError::ApiError { status, error_body }
}

fn first_choice_content(response: ChatCompletionResponse) -> Result<String, ApiConnectionError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(ApiConnectionError::EmptyResponse)
}

#[async_trait]
impl LanguageModel for Provider {
    async fn complete_text(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, ApiConnectionError> {
        match self {
            Provider::OpenRouter { model, .. } => {
                let request = ChatCompletionRequest {
                    model: model.clone(),
                    messages: vec![ChatMessage::user(prompt)],
                    response_format: None,
                    temperature: Some(CHAT_TEMPERATURE),
                    max_tokens: Some(max_tokens),
                };
                let response = self.call_chat_completion(request).await?;
                first_choice_content(response)
            }
            Provider::Anthropic { model, .. } => {
                let request = MessagesRequest {
                    model: model.clone(),
                    max_tokens,
                    temperature: CHAT_TEMPERATURE,
                    messages: vec![ChatMessage::user(prompt)],
                    tools: Vec::new(),
                    tool_choice: None,
                };
                let response = self.call_messages(request).await?;
                response
                    .first_text()
                    .map(str::to_string)
                    .ok_or(ApiConnectionError::EmptyResponse)
            }
        }
    }

    async fn complete_structured(
        &self,
        prompt: &str,
        schema: &JsonSchemaDefinition,
    ) -> Result<serde_json::Value, ApiConnectionError> {
        match self {
            Provider::OpenRouter { model, .. } => {
                let request = ChatCompletionRequest {
                    model: model.clone(),
                    messages: vec![ChatMessage::user(prompt)],
                    response_format: Some(ResponseFormat {
                        format_type: "json_schema".to_string(),
                        json_schema: Some(schema.clone()),
                    }),
                    temperature: Some(STRUCTURED_TEMPERATURE),
                    max_tokens: Some(STRUCTURED_MAX_TOKENS),
                };
                let content = first_choice_content(self.call_chat_completion(request).await?)?;
                let json = strip_code_fences(&content);
                debug!(bytes = json.len(), "structured response received");
                Ok(serde_json::from_str(json)?)
            }
            Provider::Anthropic { model, .. } => {
                let request = MessagesRequest {
                    model: model.clone(),
                    max_tokens: STRUCTURED_MAX_TOKENS,
                    temperature: STRUCTURED_TEMPERATURE,
                    messages: vec![ChatMessage::user(prompt)],
                    tools: vec![AnthropicTool {
                        name: schema.name.clone(),
                        description: schema.description.clone().unwrap_or_default(),
                        input_schema: schema.schema.clone(),
                    }],
                    tool_choice: Some(AnthropicToolChoice {
                        choice_type: "tool".to_string(),
                        name: schema.name.clone(),
                    }),
                };
                let response = self.call_messages(request).await?;
                response
                    .tool_input(&schema.name)
                    .cloned()
                    .ok_or_else(|| ApiConnectionError::MissingToolOutput(schema.name.clone()))
            }
        }
    }
}
