//! OpenAI GPT API provider implementation.

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::json;

use crate::config::LlmConfig;
use crate::error::{Result, SchemaGenError};

use super::provider::{Generation, LlmProvider, TokenUsage};

/// OpenAI API endpoint.
const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI GPT provider.
pub struct OpenAIProvider {
    client: Client,
    api_key: String,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(api_key, LlmConfig::default())
    }

    /// Create a new OpenAI provider with custom configuration.
    pub fn with_config(api_key: impl Into<String>, config: LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SchemaGenError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            config,
        })
    }

    /// Create from environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            SchemaGenError::Config("OPENAI_API_KEY environment variable not set".to_string())
        })?;
        Self::new(api_key)
    }

    /// Build headers for API requests.
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|e| SchemaGenError::Config(format!("Invalid API key: {}", e)))?,
        );
        Ok(headers)
    }
}

impl LlmProvider for OpenAIProvider {
    fn generate(&self, prompt: &str, system_message: &str) -> Result<Generation> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "messages": [
                {
                    "role": "system",
                    "content": system_message
                },
                {
                    "role": "user",
                    "content": prompt
                }
            ]
        });

        let response = self
            .client
            .post(API_URL)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .map_err(|e| SchemaGenError::Provider(format!("API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().unwrap_or_default();
            return Err(SchemaGenError::Provider(format!(
                "OpenAI API error ({}): {}",
                status, error_text
            )));
        }

        let api_response: OpenAIResponse = response
            .json()
            .map_err(|e| SchemaGenError::Provider(format!("Failed to parse API response: {}", e)))?;

        let content = api_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| SchemaGenError::Provider("No response from OpenAI".to_string()))?;

        let token_usage = api_response
            .usage
            .map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            })
            .unwrap_or_default();

        Ok(Generation {
            content,
            token_usage,
        })
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// OpenAI API response structure.
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: String,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
    #[serde(default)]
    total_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_construction() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().temperature, 0.0);
    }

    #[test]
    fn test_usage_deserialization_tolerates_missing_fields() {
        let parsed: OpenAIResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"content": "{}"}}]}"#,
        )
        .unwrap();
        assert!(parsed.usage.is_none());
        assert_eq!(parsed.choices[0].message.content, "{}");
    }
}
