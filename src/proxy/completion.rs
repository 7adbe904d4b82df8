use std::time::Duration;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::config::OpenAiConfig;
use crate::error::ProxyError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Optional context goes first as a system message, then the user prompt.
    pub fn new(model: &str, prompt: &str, context: Option<&str>) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(context) = context {
            messages.push(ChatMessage {
                role: "system".into(),
                content: context.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".into(),
            content: prompt.to_string(),
        });

        Self {
            model: model.to_string(),
            messages,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

/// Upstream that turns a chat request into a completion.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProxyError>;
}

/// Stand-in used until a real upstream is configured; every call fails
/// the way a missing API key does.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnconfiguredCompletions;

#[async_trait]
impl CompletionClient for UnconfiguredCompletions {
    async fn complete(&self, _request: &ChatRequest) -> Result<ChatResponse, ProxyError> {
        Err(ProxyError::InvalidApiKey)
    }
}

pub struct OpenAiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: &OpenAiConfig) -> Result<Self, ProxyError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProxyError::RequestFailed(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone().filter(|key| !key.is_empty()),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, ProxyError> {
        let api_key = self.api_key.as_deref().ok_or(ProxyError::InvalidApiKey)?;

        let res = self.http.post(&self.api_url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| ProxyError::RequestFailed(e.to_string()))?;

        match res.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Completion API rejected the configured key");
                return Err(ProxyError::InvalidApiKey);
            }
            StatusCode::TOO_MANY_REQUESTS => return Err(ProxyError::RateLimited),
            status if !status.is_success() => {
                return Err(ProxyError::ResponseError(format!("upstream returned {}", status)));
            }
            _ => {}
        }

        let completion: ChatResponse = res.json()
            .await
            .map_err(|e| ProxyError::ResponseError(e.to_string()))?;

        info!("Completion {} returned {} choices", completion.id, completion.choices.len());
        Ok(completion)
    }
}
