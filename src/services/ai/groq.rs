use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{ChatMessage, CompletionOptions, LlmProvider};

pub struct GroqProvider {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GroqProvider {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            client: reqwest::Client::new(),
        }
    }
}

fn build_request_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": options.temperature.unwrap_or(0.1),
    });

    if let Some(max_tokens) = options.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
    if let Some(top_p) = options.top_p {
        body["top_p"] = json!(top_p);
    }
    if !options.stop_sequences.is_empty() {
        body["stop"] = json!(options.stop_sequences);
    }

    body
}

#[async_trait]
impl LlmProvider for GroqProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> anyhow::Result<String> {
        let body = build_request_body(&self.model, messages, options);

        let resp = self
            .client
            .post("https://api.groq.com/openai/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("failed to call Groq API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Groq API error ({status}): {body}");
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Groq response")?;

        data["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Groq response"))
    }
}
