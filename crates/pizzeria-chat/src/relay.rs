//! Blocking HTTP relay to an Ollama-compatible chat endpoint.
//!
//! One call is one `POST {endpoint}/api/chat` with streaming disabled. No
//! retries are made; a failed call yields a reply text starting with
//! `ERROR` so a front end can show it in place of the model's answer.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use pizzeria_core::config::LlmConfig;
use pizzeria_core::error::{PizzeriaError, Result};
use pizzeria_core::types::ChatMessage;

use crate::error::RelayError;

/// Every failure reply starts with this.
pub const ERROR_PREFIX: &str = "ERROR";

/// Reply used when the endpoint answers 2xx with an empty body.
pub const EMPTY_BODY_REPLY: &str = "(no response from model)";

/// Anything that can carry a conversation to a model and bring back text.
pub trait ChatTransport {
    /// Send `messages` to `model` and return the reply text.
    fn try_send(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;

    /// Like [`try_send`](Self::try_send) but never fails: errors come back
    /// as a reply text starting with [`ERROR_PREFIX`].
    fn send(&self, model: &str, messages: &[ChatMessage]) -> String {
        match self.try_send(model, messages) {
            Ok(reply) => reply,
            Err(PizzeriaError::Connectivity(reply)) if is_error_reply(&reply) => reply,
            Err(e) => RelayError::Transport(e.to_string()).to_string(),
        }
    }
}

/// True when `reply` is a relay failure rather than model output.
pub fn is_error_reply(reply: &str) -> bool {
    reply.starts_with(ERROR_PREFIX)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// [`ChatTransport`] over a blocking `reqwest` client.
#[derive(Debug, Clone)]
pub struct ChatRelay {
    client: reqwest::blocking::Client,
    endpoint: String,
    health_timeout: Duration,
}

impl ChatRelay {
    /// Create a relay for `endpoint` (e.g. `http://localhost:11434`).
    ///
    /// `timeout` bounds each chat call, `health_timeout` the status probe.
    pub fn new(endpoint: &str, timeout: Duration, health_timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PizzeriaError::Connectivity(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            health_timeout,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        Self::new(
            &config.endpoint,
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.health_timeout_secs),
        )
    }

    /// Base address, without a trailing slash.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn post_chat(&self, model: &str, messages: &[ChatMessage]) -> std::result::Result<String, RelayError> {
        let url = self.url("/api/chat");
        debug!(url = %url, model, messages = messages.len(), "Sending chat request");

        let request = ChatRequest {
            model,
            messages,
            stream: false,
        };
        let response = self.client.post(&url).json(&request).send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            return Err(RelayError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let reply = extract_reply(&body);
        debug!(model, chars = reply.len(), "Chat reply received");
        Ok(reply)
    }

    /// Probe `GET {endpoint}/api/tags`. True only on HTTP 200.
    pub fn health_check(&self) -> bool {
        let url = self.url("/api/tags");
        match self.client.get(&url).timeout(self.health_timeout).send() {
            Ok(response) => {
                let healthy = response.status() == reqwest::StatusCode::OK;
                info!(url = %url, status = response.status().as_u16(), healthy, "Endpoint probed");
                healthy
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Endpoint unreachable");
                false
            }
        }
    }
}

impl ChatTransport for ChatRelay {
    fn try_send(&self, model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.post_chat(model, messages).map_err(PizzeriaError::from)
    }

    fn send(&self, model: &str, messages: &[ChatMessage]) -> String {
        self.post_chat(model, messages).unwrap_or_else(|e| {
            warn!(endpoint = %self.endpoint, model, error = %e, "Chat request failed");
            e.to_string()
        })
    }
}

/// Pull the reply text out of a response body.
///
/// Accepts `{"message": {"content": ..}}`, then a flat `content`, then a
/// flat `response`. Any other JSON is returned re-serialized; a body that is
/// not JSON is returned as is.
pub fn extract_reply(body: &str) -> String {
    let data: Value = match serde_json::from_str(body) {
        Ok(data) => data,
        Err(_) if body.is_empty() => return EMPTY_BODY_REPLY.to_string(),
        Err(_) => return body.to_string(),
    };

    if let Value::Object(map) = &data {
        if let Some(content) = map
            .get("message")
            .and_then(Value::as_object)
            .and_then(|m| m.get("content"))
        {
            return text_of(content);
        }
        for key in ["content", "response"] {
            if let Some(value) = map.get(key) {
                return text_of(value);
            }
        }
    }
    data.to_string()
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
