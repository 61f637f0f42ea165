//! External generative model client.
//!
//! Thin wrapper over the OpenAI-style `POST /chat/completions` endpoint.
//! There is deliberately no retry or backoff: simplification absorbs failures
//! through its rule-based fallback and chat reports them in the payload, so a
//! failed call fails once and returns.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::AiConfig;

pub struct AiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AiClient {
    /// Builds a client from config plus the already-resolved API key.
    /// A missing key is not an error here; calls will fail and callers
    /// degrade according to their own policy.
    pub fn new(config: &AiConfig, api_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Sends a single chat-completion request and returns the model's text
    /// verbatim. Exactly one attempt is made.
    pub async fn chat_completion(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
        temperature: f64,
    ) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => bail!("AI API key not configured"),
        };

        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "max_tokens": max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("AI API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extracts `choices[0].message.content` from a chat-completion response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid AI response: missing choices[0].message.content"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_completion_content() {
        let json = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "plain text"}}]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "plain text");
    }

    #[test]
    fn malformed_response_is_an_error() {
        let json = serde_json::json!({"choices": []});
        assert!(parse_completion_response(&json).is_err());
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = AiClient::new(&crate::config::AiConfig::default(), None).unwrap();
        let err = client
            .chat_completion("system", "user", 10, 0.0)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
