use crate::ai::ModelConfig;
use crate::error::{GenerationError, Result};
use crate::logger::DEFAULT_LOG_FILE;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-flash-1.5";
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEMPERATURE: f32 = 0.3;
pub const DEFAULT_MAX_TOKENS: u32 = 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenRouter,
    Proxy,
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Provider::Gemini),
            "openrouter" => Ok(Provider::OpenRouter),
            "proxy" | "backend" => Ok(Provider::Proxy),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Provider::Gemini => "gemini",
            Provider::OpenRouter => "openrouter",
            Provider::Proxy => "proxy",
        };
        f.write_str(name)
    }
}

/// Everything the generation workflows need, resolved once at startup and
/// handed to the backend constructors.
#[derive(Clone)]
pub struct AppConfig {
    pub provider: Provider,
    pub gemini_api_key: Option<String>,
    pub openrouter_api_key: Option<String>,
    pub model: Option<String>,
    pub gemini_base_url: String,
    pub backend_url: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub db_path: PathBuf,
    pub log_path: PathBuf,
}

// Keys stay out of debug output.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("provider", &self.provider)
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "***"))
            .field("openrouter_api_key", &self.openrouter_api_key.as_ref().map(|_| "***"))
            .field("model", &self.model)
            .field("gemini_base_url", &self.gemini_base_url)
            .field("backend_url", &self.backend_url)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("db_path", &self.db_path)
            .field("log_path", &self.log_path)
            .finish()
    }
}

fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| "C:\\Users\\User".to_string());
        PathBuf::from(home).join(".local\\share\\learnsphere")
    } else {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/home/user".to_string());
        PathBuf::from(home).join(".local/share/learnsphere")
    }
}

pub fn default_db_path() -> PathBuf {
    get_data_dir().join("learnsphere.db")
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            gemini_api_key: None,
            openrouter_api_key: None,
            model: None,
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            db_path: default_db_path(),
            log_path: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read configuration from the process environment, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(provider) = get("LEARNSPHERE_PROVIDER") {
            config.provider = provider.parse().map_err(GenerationError::Config)?;
        }
        config.gemini_api_key = get("GEMINI_API_KEY");
        config.openrouter_api_key = get("OPENROUTER_API_KEY");
        config.model = get("LEARNSPHERE_MODEL");

        if let Some(url) = get("LEARNSPHERE_GEMINI_URL") {
            config.gemini_base_url = url;
        }
        if let Some(url) = get("LEARNSPHERE_BACKEND_URL") {
            config.backend_url = url;
        }
        if let Some(temperature) = get("LEARNSPHERE_TEMPERATURE") {
            let value: f32 = temperature.parse().map_err(|_| {
                GenerationError::Config(format!("Invalid temperature: {}", temperature))
            })?;
            config.temperature = Some(value);
        }
        if let Some(max_tokens) = get("LEARNSPHERE_MAX_TOKENS") {
            let value: u32 = max_tokens.parse().map_err(|_| {
                GenerationError::Config(format!("Invalid max tokens: {}", max_tokens))
            })?;
            config.max_tokens = Some(value);
        }
        if let Some(db) = get("LEARNSPHERE_DB") {
            config.db_path = PathBuf::from(db);
        }
        if let Some(log) = get("LEARNSPHERE_LOG") {
            config.log_path = PathBuf::from(log);
        }

        Ok(config)
    }

    /// Model settings for the selected provider
    pub fn model_config(&self) -> ModelConfig {
        let default_model = match self.provider {
            Provider::OpenRouter => DEFAULT_OPENROUTER_MODEL,
            Provider::Gemini | Provider::Proxy => DEFAULT_GEMINI_MODEL,
        };

        ModelConfig {
            model: self.model.clone().unwrap_or_else(|| default_model.to_string()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}
