use crate::ai::client::{GenerationBackend, ModelConfig};
use crate::error::{GenerationError, Result};
use crate::logger;
use crate::models::UploadedFile;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Direct client for the Gemini `generateContent` REST endpoint
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    config: ModelConfig,
}

impl GeminiClient {
    pub fn new(api_key: &str, base_url: &str, config: ModelConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            config,
        }
    }

    fn build_request(&self, prompt: &str, file: Option<&UploadedFile>) -> GeminiRequest {
        let mut parts = vec![GeminiPart {
            text: Some(prompt.to_string()),
            inline_data: None,
        }];

        if let Some(file) = file {
            parts.push(GeminiPart {
                text: None,
                inline_data: Some(InlineData {
                    mime_type: file.mime_type.clone(),
                    data: STANDARD.encode(&file.bytes),
                }),
            });
        }

        GeminiRequest {
            contents: vec![GeminiContent { parts }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_tokens,
            },
        }
    }

    /// Sends the key as a header; request URLs end up in `reqwest::Error`
    /// messages.
    fn post(&self, request: &GeminiRequest) -> reqwest::RequestBuilder {
        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.config.model
        );

        self.client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
    }

    async fn send(&self, request: GeminiRequest) -> Result<String> {
        let response = self
            .post(&request)
            .send()
            .await
            .map_err(reqwest::Error::without_url)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            logger::log(&format!("Gemini request failed ({}): {}", status, error_text));
            return Err(GenerationError::Backend(format!(
                "Gemini request failed ({}): {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse =
            response.json().await.map_err(reqwest::Error::without_url)?;
        extract_text(gemini_response)
    }
}

fn extract_text(response: GeminiResponse) -> Result<String> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<String>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(GenerationError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl GenerationBackend for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        self.send(self.build_request(prompt, None)).await
    }

    async fn generate_from_file(&self, prompt: &str, file: &UploadedFile) -> Result<String> {
        self.send(self.build_request(prompt, Some(file))).await
    }
}
