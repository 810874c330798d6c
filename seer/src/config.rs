use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SeerError;

/// How to reach the vision model. Any OpenAI-compatible chat completions endpoint works; the
/// defaults point at OpenRouter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeerConfig {
    pub base_url: String,
    pub model: String,
    /// The name of the environment variable that holds the API key. The key itself never lives
    /// in the config file.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Zero disables the client-side timeout.
    pub request_timeout_secs: u64,
    /// Sent as the `HTTP-Referer` header, which OpenRouter uses for attribution.
    pub referer: Option<String>,
    /// Sent as the `X-Title` header.
    pub title: Option<String>,
    /// The game named in the prompts.
    pub game: String,
}

impl Default for SeerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_owned(),
            model: "qwen/qwen2.5-vl-72b-instruct:free".to_owned(),
            api_key_env: "OPENROUTER_API_KEY".to_owned(),
            max_tokens: 20,
            temperature: 0.7,
            request_timeout_secs: 60,
            referer: None,
            title: None,
            game: "Pokémon Blue".to_owned(),
        }
    }
}

impl SeerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeerError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|source| SeerError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&data).map_err(|source| SeerError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(data)
    }

    /// The full URL requests are posted to.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
}
