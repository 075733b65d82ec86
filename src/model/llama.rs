//! LlamaServerModel — OpenAI-compatible chat completions over HTTP.
//!
//! Talks to a local `llama-server` (or anything speaking the same protocol).
//! Blocking, one request per question, bounded by the configured timeout.

use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

use super::{parse_intent, system_prompt, IntentModel};
use crate::config::ModelConfig;
use crate::error::QueryError;
use crate::tools::Intent;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: String,
}

pub struct LlamaServerModel {
    url: String,
    model: String,
    timeout: Duration,
    system_prompt: String,
    client: reqwest::blocking::Client,
}

impl LlamaServerModel {
    pub fn new(config: &ModelConfig) -> Result<Self, QueryError> {
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("meridian/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| QueryError::ModelFailure(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            url: config.url.clone(),
            model: config.model.clone(),
            timeout,
            system_prompt: system_prompt(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Probe `/health` on the endpoint's host.
    pub fn health(&self) -> Result<(), QueryError> {
        let base = reqwest::Url::parse(&self.url)
            .map_err(|e| QueryError::ModelFailure(format!("invalid model url {}: {}", self.url, e)))?;
        let health = base
            .join("/health")
            .map_err(|e| QueryError::ModelFailure(e.to_string()))?;

        let response = self
            .client
            .get(health.clone())
            .send()
            .map_err(|e| self.classify(e))?;
        if !response.status().is_success() {
            return Err(QueryError::ModelFailure(format!(
                "{} answered {}",
                health,
                response.status()
            )));
        }
        debug!(url = %health, "model endpoint healthy");
        Ok(())
    }

    fn classify(&self, err: reqwest::Error) -> QueryError {
        if err.is_timeout() {
            QueryError::Timeout(format!("model did not answer within {}s", self.timeout.as_secs()))
        } else if err.is_connect() {
            QueryError::ModelFailure(format!("cannot connect to model server at {}: {}", self.url, err))
        } else {
            QueryError::ModelFailure(err.to_string())
        }
    }
}

impl IntentModel for LlamaServerModel {
    fn propose(&self, text: &str) -> Result<Intent, QueryError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": text }
            ]
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(QueryError::ModelFailure(format!("model http error {}: {}", status, detail)));
        }

        let chat: ChatResponse = response
            .json()
            .map_err(|e| self.classify(e))?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| QueryError::ModelFailure("model returned no choices".to_string()))?;

        debug!(content = %content, "model output");
        let intent = parse_intent(&content)?;
        info!(tool = %intent.tool, "model proposed tool call");
        Ok(intent)
    }
}
