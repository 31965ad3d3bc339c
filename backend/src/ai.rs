//! Optional local-LLM assistance via Ollama's HTTP API.
//!
//! This module intentionally only supports a local Ollama server and refuses
//! to run against a non-local base URL. Every caller has a deterministic
//! fallback; LLM failures degrade, never error the request.

use anyhow::{anyhow, Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

/// Configuration for talking to a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClientConfig {
    pub base_url: String,
    pub model: String,
}

impl OllamaClientConfig {
    /// Loads config from env vars:
    /// - `OLLAMA_BASE_URL` (default: `http://localhost:11434`)
    /// - `OLLAMA_MODEL`    (default: `llama3.2`)
    pub fn from_env() -> Self {
        let base_url = std::env::var("OLLAMA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".to_string());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string());
        Self { base_url, model }
    }
}

/// Minimal Ollama chat client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    http: Client,
    base_url: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(config: OllamaClientConfig) -> Result<Self> {
        let base_url = validate_local_base_url(&config.base_url)?;

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url,
            model: config.model,
        })
    }

    /// Generic helper for a single-turn chat call.
    pub async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let endpoint = self
            .base_url
            .join("api/chat")
            .context("Failed to build Ollama /api/chat URL")?;

        let request = OllamaChatRequest {
            model: self.model.clone(),
            stream: false,
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            options: Some(OllamaOptions {
                temperature: Some(0.0),
            }),
        };

        let response: OllamaChatResponse = self
            .http
            .post(endpoint.clone())
            .json(&request)
            .send()
            .await
            .with_context(|| format!("POST {endpoint} failed"))?
            .error_for_status()
            .with_context(|| format!("POST {endpoint} returned non-success status"))?
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {endpoint}"))?;

        let content = response
            .message
            .map(|m| m.content)
            .ok_or_else(|| anyhow!("Ollama response had no message content"))?;

        Ok(content.trim().to_string())
    }

    /// Chat, then parse the reply as a JSON value of type `T` after stripping
    /// any markdown fences the model wrapped it in.
    pub async fn chat_json<T: serde::de::DeserializeOwned>(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<T> {
        let raw = self.chat(system_prompt, user_prompt).await?;
        let cleaned = clean_json_text(&raw);
        serde_json::from_str(cleaned).with_context(|| {
            let preview: String = raw.chars().take(200).collect();
            format!("Model reply was not valid JSON: {preview}")
        })
    }
}

fn validate_local_base_url(base_url: &str) -> Result<Url> {
    let url = Url::parse(base_url).with_context(|| format!("Invalid base URL: {base_url}"))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(anyhow!("Base URL must be http(s): {base_url}"));
    }

    let host = url.host_str().unwrap_or_default();
    let local = host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
    if !local {
        return Err(anyhow!(
            "Refusing non-local Ollama base URL {base_url}; this client only talks to a local server"
        ));
    }

    Ok(url)
}

/// Extract a JSON object from a model reply that may be wrapped in
/// ```` ```json ```` fences or prefixed with a stray "json" token.
pub fn clean_json_text(raw: &str) -> &str {
    let text = raw.trim();
    if text.contains("```") {
        for part in text.split("```") {
            let mut part = part.trim();
            if let Some(stripped) = part.strip_prefix("json") {
                part = stripped.trim();
            }
            if part.starts_with('{') {
                return part;
            }
        }
    }
    let text = text.strip_prefix("json").map(str::trim).unwrap_or(text);
    text
}

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    stream: bool,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<OllamaOptions>,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: Option<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_json_handles_fenced_blocks() {
        let fenced = "Here you go:\n```json\n{\"a\": 1}\n```\nanything else";
        assert_eq!(clean_json_text(fenced), "{\"a\": 1}");

        let bare_fence = "```\n{\"a\": 1}\n```";
        assert_eq!(clean_json_text(bare_fence), "{\"a\": 1}");
    }

    #[test]
    fn clean_json_strips_leading_json_token() {
        assert_eq!(clean_json_text("json {\"a\": 1}"), "{\"a\": 1}");
        assert_eq!(clean_json_text("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn rejects_non_local_base_url() {
        assert!(validate_local_base_url("http://localhost:11434").is_ok());
        assert!(validate_local_base_url("http://127.0.0.1:11434").is_ok());
        assert!(validate_local_base_url("http://example.com:11434").is_err());
        assert!(validate_local_base_url("ftp://localhost").is_err());
        assert!(validate_local_base_url("not a url").is_err());
    }
}
