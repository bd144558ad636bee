use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::{ChatMessage, CompletionOptions, LlmProvider};

pub struct OllamaProvider {
    url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaProvider {
    pub fn new(url: String, model: String) -> Self {
        Self {
            url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

fn build_request_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
    let mut model_options = json!({});
    if let Some(temperature) = options.temperature {
        model_options["temperature"] = json!(temperature);
    }
    if let Some(max_tokens) = options.max_tokens {
        model_options["num_predict"] = json!(max_tokens);
    }
    if let Some(top_p) = options.top_p {
        model_options["top_p"] = json!(top_p);
    }
    if !options.stop_sequences.is_empty() {
        model_options["stop"] = json!(options.stop_sequences);
    }

    json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "options": model_options,
    })
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> anyhow::Result<String> {
        let body = build_request_body(&self.model, messages, options);

        let resp = self
            .client
            .post(format!("{}/api/chat", self.url))
            .json(&body)
            .send()
            .await
            .context("failed to call Ollama API")?
            .error_for_status()
            .context("Ollama API returned error")?;

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse Ollama response")?;

        data["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing content in Ollama response"))
    }
}
