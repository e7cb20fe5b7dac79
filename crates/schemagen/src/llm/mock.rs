//! Mock LLM provider for testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::config::LlmConfig;
use crate::error::{Result, SchemaGenError};

use super::provider::{Generation, LlmProvider, TokenUsage};

/// A scripted reply or failure.
enum Scripted {
    Reply(String),
    Failure(String),
}

/// Mock provider that plays back a scripted sequence of replies.
///
/// Each `generate` call consumes the next script entry; an exhausted script
/// is a provider error, which exercises the same fallback path a real
/// provider failure would.
pub struct MockProvider {
    config: LlmConfig,
    script: Mutex<VecDeque<Scripted>>,
    prompts: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Create a mock with an empty script.
    pub fn new() -> Self {
        Self {
            config: LlmConfig::default(),
            script: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a reply with the given content.
    pub fn reply(self, content: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Reply(content.into()));
        }
        self
    }

    /// Queue a provider failure with the given message.
    pub fn failure(self, message: impl Into<String>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script.push_back(Scripted::Failure(message.into()));
        }
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmProvider for MockProvider {
    fn generate(&self, prompt: &str, _system_message: &str) -> Result<Generation> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let next = self
            .script
            .lock()
            .ok()
            .and_then(|mut script| script.pop_front());

        match next {
            Some(Scripted::Reply(content)) => {
                let completion_tokens = content.split_whitespace().count() as u64;
                let prompt_tokens = prompt.split_whitespace().count() as u64;
                Ok(Generation {
                    content,
                    token_usage: TokenUsage {
                        prompt_tokens,
                        completion_tokens,
                        total_tokens: prompt_tokens + completion_tokens,
                    },
                })
            }
            Some(Scripted::Failure(message)) => Err(SchemaGenError::Provider(message)),
            None => Err(SchemaGenError::Provider(
                "mock script exhausted".to_string(),
            )),
        }
    }

    fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_replies_in_order() {
        let provider = MockProvider::new().reply("first").reply("second");

        assert_eq!(provider.generate("p1", "s").unwrap().content, "first");
        assert_eq!(provider.generate("p2", "s").unwrap().content, "second");
        assert_eq!(provider.prompts(), vec!["p1", "p2"]);
    }

    #[test]
    fn test_scripted_failure() {
        let provider = MockProvider::new().failure("rate limited");

        let err = provider.generate("p", "s").unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_exhausted_script_is_an_error() {
        let provider = MockProvider::new();
        assert!(provider.generate("p", "s").is_err());
    }

    #[test]
    fn test_token_usage_reported() {
        let provider = MockProvider::new().reply("a b c");
        let generation = provider.generate("one two", "s").unwrap();
        assert_eq!(generation.token_usage.completion_tokens, 3);
        assert_eq!(generation.token_usage.prompt_tokens, 2);
        assert_eq!(generation.token_usage.total_tokens, 5);
    }
}
