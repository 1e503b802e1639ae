use crate::ai::client::GenerationBackend;
use crate::error::{GenerationError, Result};
use crate::logger;
use crate::models::UploadedFile;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Body returned by both backend endpoints
#[derive(Debug, Deserialize)]
struct SolutionResponse {
    solution: String,
}

/// Client for the document backend: `/text/` takes a prompt, `/text-file/`
/// takes a prompt plus one uploaded document. Both answer with the model's
/// raw text under `solution`.
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProxyClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/", self.base_url, path)
    }

    async fn submit(&self, url: String, form: Form) -> Result<String> {
        let response = self.client.post(&url).multipart(form).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            logger::log(&format!("Backend request to {} failed ({}): {}", url, status, error_text));
            return Err(GenerationError::Backend(format!(
                "Backend request failed ({}): {}",
                status, error_text
            )));
        }

        let body: SolutionResponse = response.json().await?;
        if body.solution.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(body.solution)
    }
}

#[async_trait]
impl GenerationBackend for ProxyClient {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn generate_text(&self, prompt: &str) -> Result<String> {
        let form = Form::new().text("prompt", prompt.to_string());
        self.submit(self.endpoint("text"), form).await
    }

    async fn generate_from_file(&self, prompt: &str, file: &UploadedFile) -> Result<String> {
        let part = Part::bytes(file.bytes.clone())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        let form = Form::new()
            .text("prompt", prompt.to_string())
            .part("file", part);
        self.submit(self.endpoint("text-file"), form).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_match_backend_routes() {
        let client = ProxyClient::new("http://localhost:8000/");
        assert_eq!(client.endpoint("text"), "http://localhost:8000/text/");
        assert_eq!(client.endpoint("text-file"), "http://localhost:8000/text-file/");
    }

    #[test]
    fn test_solution_body_parses() {
        let body: SolutionResponse =
            serde_json::from_str(r#"{"solution": "```json\n[]\n```"}"#).unwrap();
        assert_eq!(body.solution, "```json\n[]\n```");
    }
}
