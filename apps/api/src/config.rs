use anyhow::{Context, Result};
use std::str::FromStr;

/// Application configuration loaded from environment variables.
/// Every setting has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub ollama_host: String,
    pub ollama_port: u16,
    pub default_model: String,
    pub max_file_size_mb: usize,
    pub llm_timeout_secs: u64,
    pub session_ttl_secs: u64,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "0.0.0.0".to_string(),
            port: 8000,
            ollama_host: "http://localhost".to_string(),
            ollama_port: 11434,
            default_model: "llama3.1".to_string(),
            max_file_size_mb: 5,
            llm_timeout_secs: 120,
            session_ttl_secs: 3600,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = Config::default();
        Ok(Config {
            host: env_or("API_HOST", defaults.host),
            port: parse_env("API_PORT", defaults.port)?,
            ollama_host: env_or("OLLAMA_HOST", defaults.ollama_host),
            ollama_port: parse_env("OLLAMA_PORT", defaults.ollama_port)?,
            default_model: env_or("DEFAULT_MODEL", defaults.default_model),
            max_file_size_mb: parse_env("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", defaults.llm_timeout_secs)?,
            session_ttl_secs: parse_env("SESSION_TTL_SECS", defaults.session_ttl_secs)?,
            rust_log: env_or("RUST_LOG", defaults.rust_log),
        })
    }

    /// Base URL of the Ollama server, e.g. `http://localhost:11434`.
    pub fn ollama_url(&self) -> String {
        format!("{}:{}", self.ollama_host.trim_end_matches('/'), self.ollama_port)
    }

    /// Upload limit in bytes; saturates instead of overflowing.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
