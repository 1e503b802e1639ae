pub mod client;
pub mod exam;
pub mod gemini;
pub mod math;
pub mod parser;
pub mod prompts;
pub mod proxy;
pub mod sanitize;

use crate::config::{AppConfig, Provider};
use crate::error::{GenerationError, Result};
use std::sync::Arc;

// Public API exports
pub use client::{GenerationBackend, ModelConfig, OpenRouterClient};
pub use exam::{ExamGenerator, ExamOutcome, ExamRequest, FileFailure};
pub use gemini::GeminiClient;
pub use math::{MathOutcome, MathRequest, MathSolver};
pub use parser::{parse_exam_response, parse_math_response};
pub use proxy::ProxyClient;
pub use sanitize::{repair_unescaped_unit_quotes, sanitize};

/// Build the backend selected by the configuration
pub fn create_backend(config: &AppConfig) -> Result<Arc<dyn GenerationBackend>> {
    match config.provider {
        Provider::Gemini => {
            let key = config.gemini_api_key.as_deref().ok_or_else(|| {
                GenerationError::Config("GEMINI_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(GeminiClient::new(
                key,
                &config.gemini_base_url,
                config.model_config(),
            )))
        }
        Provider::OpenRouter => {
            let key = config.openrouter_api_key.as_deref().ok_or_else(|| {
                GenerationError::Config("OPENROUTER_API_KEY is not set".to_string())
            })?;
            Ok(Arc::new(OpenRouterClient::new(key, config.model_config())?))
        }
        Provider::Proxy => Ok(Arc::new(ProxyClient::new(&config.backend_url))),
    }
}
