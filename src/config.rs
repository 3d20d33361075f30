//! Configuration module - CLI arguments and settings

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};

use crate::service::{
    DEFAULT_BASE_URL, DEFAULT_MAX_TOKENS, DEFAULT_OPENAI_MODEL, DEFAULT_TEMPERATURE,
};

/// Default first port tried by the Web UI server
pub const DEFAULT_PORT: u16 = 3000;

/// Default idle lifetime of a form session (30 minutes)
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub port: Option<u16>,
    pub session_ttl_secs: Option<u64>,
    pub no_browser: bool,
    pub http_log_path: Option<PathBuf>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub port: u16,
    pub session_ttl_secs: u64,
    pub open_browser: bool,
    pub http_log_path: Option<PathBuf>,
}

impl Config {
    /// Create a new Config, filling defaults and validating values
    pub fn new(options: ConfigOptions) -> Result<Arc<Self>> {
        let base_url = normalize_base_url(
            options
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_BASE_URL),
        )?;

        let model = match options.model.as_deref().map(str::trim) {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => DEFAULT_OPENAI_MODEL.to_string(),
        };

        let max_tokens = options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        if max_tokens == 0 {
            return Err(anyhow!("max_tokens must be greater than zero"));
        }

        let temperature = options.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(anyhow!(
                "temperature must be between 0.0 and 2.0, got {}",
                temperature
            ));
        }

        let session_ttl_secs = options.session_ttl_secs.unwrap_or(DEFAULT_SESSION_TTL_SECS);
        if session_ttl_secs == 0 {
            return Err(anyhow!("session ttl must be greater than zero"));
        }

        Ok(Arc::new(Self {
            base_url,
            model,
            max_tokens,
            temperature,
            port: options.port.unwrap_or(DEFAULT_PORT),
            session_ttl_secs,
            open_browser: !options.no_browser,
            http_log_path: options.http_log_path,
        }))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            port: DEFAULT_PORT,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            open_browser: true,
            http_log_path: None,
        }
    }
}

/// Add a scheme when missing and drop trailing slashes.
/// Plain `http://` is kept so local OpenAI-compatible servers work.
fn normalize_base_url(base_url: &str) -> Result<String> {
    let base_url = base_url.trim();
    if base_url.is_empty() {
        return Err(anyhow!("base_url cannot be empty"));
    }

    let base_url = if base_url.starts_with("http://") || base_url.starts_with("https://") {
        base_url.to_string()
    } else {
        format!("https://{}", base_url)
    };

    let base_url = base_url.trim_end_matches('/').to_string();
    if base_url == "https:" || base_url == "http:" {
        return Err(anyhow!("base_url cannot be empty"));
    }
    Ok(base_url)
}
