//! Text completion service
//!
//! The assistant chat depends only on [`TextCompletionService`]; the HTTP
//! implementation talks to a Gemini-style `generateContent` endpoint.
//! One request per prompt, no retry.

use crate::errors::{AssessError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variable holding the API key unless configured otherwise
pub const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Prompt in, generated text out
#[async_trait]
pub trait TextCompletionService: Send + Sync {
    /// Generate text for a prompt
    ///
    /// An empty string means the service answered without any text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// HTTP client settings
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// `generateContent` client
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    config: ChatConfig,
}

impl GeminiClient {
    pub fn new(config: ChatConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(AssessError::HttpError)?;

        Ok(Self { client, config })
    }

    /// Full request URL, without the key
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn has_api_key(&self) -> bool {
        self.config.api_key.is_some()
    }
}

#[async_trait]
impl TextCompletionService for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AssessError::CompletionApiError("No API key configured".to_string())
        })?;

        let request = GenerateRequest::from_prompt(prompt);

        let response = self
            .client
            .post(self.url())
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| AssessError::CompletionApiError(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AssessError::CompletionApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AssessError::CompletionApiError(format!("Failed to parse response: {}", e)))?;

        Ok(body.first_text().unwrap_or_default())
    }
}

/// `generateContent` request body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
}

impl GenerateRequest {
    pub fn from_prompt(prompt: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

/// `generateContent` response body (only the fields we read)
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
}

impl GenerateResponse {
    /// Text of the first part of the first candidate
    pub fn first_text(&self) -> Option<String> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .first()
            .map(|p| p.text.clone())
            .filter(|t| !t.is_empty())
    }
}
