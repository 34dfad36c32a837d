//! Client for the upstream OpenAI-compatible model server
//!
//! LM Studio (and compatible servers) expose `/v1/models` and
//! `/v1/chat/completions`; the gateway consumes both.

use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde_json::{Value, json};
use url::Url;

use crate::config::UpstreamConfig;
use crate::error::{MedgateError, Result};

/// HTTP client for the upstream model server
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: reqwest::Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a client for the configured upstream
    pub fn new(config: UpstreamConfig) -> Result<Self> {
        Url::parse(&config.base_url)
            .map_err(|e| MedgateError::Config(format!("Invalid upstream base URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| MedgateError::Upstream(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Configured model identifier
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Configured base URL
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// List model ids available on the upstream server
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.endpoint("models"))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(MedgateError::Upstream(format!(
                "Model listing failed with status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MedgateError::Upstream(format!("Invalid model listing: {e}")))?;

        let models = body
            .get("data")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| entry.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(models)
    }

    fn chat_body(&self, system_prompt: &str, user_message: &str, stream: bool) -> Value {
        json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_message},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "stream": stream,
        })
    }

    /// Run a non-streaming chat completion and return the assistant reply
    pub async fn chat_completion(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<String> {
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .json(&self.chat_body(system_prompt, user_message, false))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(MedgateError::Upstream(format!(
                "Chat completion failed with status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| MedgateError::Upstream(format!("Invalid completion response: {e}")))?;

        body.get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                MedgateError::Upstream("Completion response carried no content".to_string())
            })
    }

    /// Start a streaming chat completion and return the raw SSE byte stream
    pub async fn chat_completion_stream(
        &self,
        system_prompt: &str,
        user_message: &str,
    ) -> Result<BoxStream<'static, reqwest::Result<Bytes>>> {
        let response = self
            .client
            .post(self.endpoint("chat/completions"))
            .json(&self.chat_body(system_prompt, user_message, true))
            .send()
            .await
            .map_err(map_send_error)?;

        if !response.status().is_success() {
            return Err(MedgateError::Upstream(format!(
                "Chat completion failed with status {}",
                response.status()
            )));
        }

        Ok(response.bytes_stream().boxed())
    }
}

fn map_send_error(e: reqwest::Error) -> MedgateError {
    if e.is_timeout() {
        MedgateError::Upstream(format!("Request timed out: {e}"))
    } else if e.is_connect() {
        MedgateError::Upstream(format!("Failed to connect to upstream: {e}"))
    } else {
        MedgateError::Upstream(format!("Request failed: {e}"))
    }
}
