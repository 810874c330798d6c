//! Seer shows the Gameboy's screen to a vision model and asks it what to press next.
//!
//! [`VisionClient`] speaks the OpenAI chat completions format, so it works with OpenRouter (the
//! default) and anything else that exposes that API. It implements [`pilot::Oracle`], so it can
//! be handed straight to a [`pilot::DecisionLoop`].

use std::time::Instant;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use pilot::{BoxError, Frame, Oracle, OracleFuture};
use tracing::debug;

pub mod config;
pub mod error;
pub mod prompt;
pub mod wire;

pub use config::SeerConfig;
pub use error::SeerError;

use prompt::{system_prompt, user_prompt};
use wire::{ChatRequest, ChatResponse, Message, Part};

pub struct VisionClient {
    http: reqwest::Client,
    config: SeerConfig,
    api_key: String,
}

impl VisionClient {
    /// Creates a client, reading the API key from the environment variable named in the config.
    pub fn new(config: SeerConfig) -> Result<Self, SeerError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| SeerError::MissingApiKey {
                var: config.api_key_env.clone(),
            })?;
        Self::with_api_key(config, api_key)
    }

    pub fn with_api_key(
        config: SeerConfig,
        api_key: impl Into<String>,
    ) -> Result<Self, SeerError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            config,
            api_key: api_key.into(),
        })
    }

    pub fn config(&self) -> &SeerConfig {
        &self.config
    }

    /// Builds the request body for one question about one frame.
    pub fn request(&self, frame: &Frame, history: &str) -> Result<ChatRequest, SeerError> {
        let image = BASE64.encode(frame.to_png()?);
        let game = &self.config.game;
        Ok(ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                Message::system(system_prompt(game)),
                Message::user(vec![
                    Part::png(&image),
                    Part::text(user_prompt(game, history)),
                ]),
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        })
    }

    /// Asks the model what to do, given the current screen and the recent history. Returns the
    /// first line of the reply, untranslated.
    pub async fn ask(&self, frame: &Frame, history: &str) -> Result<String, SeerError> {
        let body = self.request(frame, history)?;
        let mut request = self
            .http
            .post(self.config.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body);
        if let Some(referer) = &self.config.referer {
            request = request.header("HTTP-Referer", referer);
        }
        if let Some(title) = &self.config.title {
            request = request.header("X-Title", title);
        }

        let start = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SeerError::Status { status, body });
        }
        let reply: ChatResponse = response.json().await?;
        let line = reply.first_line().ok_or(SeerError::EmptyReply)?.to_owned();
        debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "model replied {line:?}"
        );
        Ok(line)
    }
}

impl Oracle for VisionClient {
    fn infer<'a>(&'a self, frame: &'a Frame, history: &'a str) -> OracleFuture<'a> {
        Box::pin(async move { Ok::<_, BoxError>(self.ask(frame, history).await?) })
    }
}
