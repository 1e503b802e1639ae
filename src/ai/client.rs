use crate::error::{GenerationError, Result};
use crate::models::UploadedFile;
use async_trait::async_trait;
use openrouter_api::{
    models::provider_preferences::ProviderPreferences,
    models::provider_preferences::ProviderSort,
    types::chat::{ChatCompletionRequest, Message},
};
use serde::Serialize;

const SYSTEM_PROMPT: &str = "You are an educational assistant that writes practice exams and \
solves math problems. Always answer with the exact JSON structure requested.";

/// Something that can turn a prompt, optionally with one attached file, into raw model text.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn generate_text(&self, prompt: &str) -> Result<String>;

    async fn generate_from_file(&self, prompt: &str, file: &UploadedFile) -> Result<String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelConfig {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Prompt layout used when a text document is inlined rather than attached
pub fn inline_document(prompt: &str, document: &str) -> String {
    format!("{}\n\n--- Document Content ---\n{}", prompt, document)
}

#[derive(Debug)]
pub struct OpenRouterClient {
    client: openrouter_api::OpenRouterClient<openrouter_api::Ready>,
    config: ModelConfig,
}

impl OpenRouterClient {
    pub fn new(api_key: &str, config: ModelConfig) -> Result<Self> {
        let client = openrouter_api::OpenRouterClient::from_api_key(api_key).map_err(|e| {
            GenerationError::Config(format!("Failed to create OpenRouter client: {}", e))
        })?;

        Ok(Self { client, config })
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages = vec![
            Message::text("system", SYSTEM_PROMPT),
            Message::text("user", prompt),
        ];

        let provider = ProviderPreferences::new().with_sort(ProviderSort::Throughput);

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            provider: Some(provider),
            stream: None,
            response_format: None,
            tools: None,
            tool_choice: None,
            models: None,
            transforms: None,
            route: None,
            user: None,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: None,
            top_k: None,
            frequency_penalty: None,
            presence_penalty: None,
            repetition_penalty: None,
            min_p: None,
            top_a: None,
            seed: None,
            stop: None,
            logit_bias: None,
            logprobs: None,
            top_logprobs: None,
            prediction: None,
            parallel_tool_calls: None,
            verbosity: None,
        };

        let response = self
            .client
            .chat()
            .map_err(|e| GenerationError::Backend(format!("OpenRouter API error: {}", e)))?
            .chat_completion(request)
            .await
            .map_err(|e| GenerationError::Backend(format!("OpenRouter API error: {}", e)))?;

        let choice = response.choices.first().ok_or(GenerationError::EmptyResponse)?;
        let text = match &choice.message.content {
            openrouter_api::MessageContent::Text(text) => text.clone(),
            openrouter_api::MessageContent::Parts(parts) => parts
                .iter()
                .filter_map(|p| {
                    if let openrouter_api::ContentPart::Text(tc) = p {
                        Some(tc.text.clone())
                    } else {
                        None
                    }
                })
                .collect::<Vec<String>>()
                .join("\n"),
        };

        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(text)
    }
}

#[async_trait]
impl GenerationBackend for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.complete(prompt).await
    }

    async fn generate_from_file(&self, prompt: &str, file: &UploadedFile) -> Result<String> {
        if !file.is_text() {
            return Err(GenerationError::UnsupportedFile {
                name: file.name.clone(),
                reason: format!(
                    "the openrouter provider only accepts text documents, got {}",
                    file.mime_type
                ),
            });
        }

        let document = String::from_utf8_lossy(&file.bytes);
        self.complete(&inline_document(prompt, &document)).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A recorded backend call: the prompt and the attached file name, if any
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub prompt: String,
        pub file: Option<String>,
    }

    /// Scripted backend for workflow tests. Answers are handed out in order;
    /// once they run out every call fails.
    pub struct MockBackend {
        answers: Mutex<VecDeque<Result<String>>>,
        calls: Mutex<Vec<RecordedCall>>,
    }

    impl MockBackend {
        pub fn new(answers: Vec<Result<String>>) -> Self {
            Self {
                answers: Mutex::new(answers.into()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_texts(answers: &[&str]) -> Self {
            Self::new(answers.iter().map(|a| Ok(a.to_string())).collect())
        }

        pub fn calls(&self) -> Vec<RecordedCall> {
            self.calls.lock().unwrap().clone()
        }

        fn next(&self, prompt: &str, file: Option<&UploadedFile>) -> Result<String> {
            self.calls.lock().unwrap().push(RecordedCall {
                prompt: prompt.to_string(),
                file: file.map(|f| f.name.clone()),
            });
            self.answers
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(GenerationError::Backend("no scripted answer".to_string())))
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn generate_text(&self, prompt: &str) -> Result<String> {
            self.next(prompt, None)
        }

        async fn generate_from_file(&self, prompt: &str, file: &UploadedFile) -> Result<String> {
            self.next(prompt, Some(file))
        }
    }
}
