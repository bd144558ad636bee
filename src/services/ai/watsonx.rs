use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;

use super::{ChatMessage, CompletionOptions, LlmProvider};

pub const DEFAULT_IAM_URL: &str = "https://iam.cloud.ibm.com/identity/token";
const CHAT_API_VERSION: &str = "2023-05-29";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);
/// Refresh this long before the IAM token actually expires.
const TOKEN_EXPIRY_MARGIN_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct WatsonxSettings {
    pub api_key: String,
    pub project_id: String,
    pub model_id: String,
    pub endpoint: String,
    pub iam_url: String,
}

#[derive(Deserialize)]
struct IamTokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct IamToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl IamToken {
    fn from_response(resp: IamTokenResponse, now: DateTime<Utc>) -> Self {
        Self {
            access_token: resp.access_token,
            expires_at: now + chrono::Duration::seconds(resp.expires_in - TOKEN_EXPIRY_MARGIN_SECS),
        }
    }

    fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

pub struct WatsonxProvider {
    settings: WatsonxSettings,
    client: reqwest::Client,
    token: Mutex<Option<IamToken>>,
}

impl WatsonxProvider {
    pub fn new(settings: WatsonxSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build watsonx HTTP client")?;

        Ok(Self {
            settings,
            client,
            token: Mutex::new(None),
        })
    }

    fn chat_url(&self) -> String {
        format!(
            "{}/ml/v1/text/chat?version={CHAT_API_VERSION}",
            self.settings.endpoint.trim_end_matches('/')
        )
    }

    async fn iam_token(&self) -> anyhow::Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid_at(Utc::now()) {
                tracing::debug!("using cached IAM token");
                return Ok(token.access_token.clone());
            }
        }

        tracing::info!("fetching new IAM token");
        let resp = self
            .client
            .post(&self.settings.iam_url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "urn:ibm:params:oauth:grant-type:apikey"),
                ("apikey", self.settings.api_key.as_str()),
            ])
            .send()
            .await
            .context("failed to call IBM Cloud IAM")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("IBM Cloud IAM error ({status}): {body}");
        }

        let data: IamTokenResponse = resp
            .json()
            .await
            .context("failed to parse IAM token response")?;

        let token = IamToken::from_response(data, Utc::now());
        let access_token = token.access_token.clone();
        *cached = Some(token);

        Ok(access_token)
    }
}

fn build_chat_payload(
    settings: &WatsonxSettings,
    messages: &[ChatMessage],
    options: &CompletionOptions,
) -> serde_json::Value {
    json!({
        "messages": messages,
        "model_id": settings.model_id,
        "project_id": settings.project_id,
        "temperature": options.temperature.unwrap_or(0.1),
        "max_tokens": options.max_tokens.unwrap_or(2000),
        "top_p": options.top_p.unwrap_or(1.0),
        "stop_sequences": options.stop_sequences,
    })
}

fn extract_content(data: &serde_json::Value) -> anyhow::Result<String> {
    data["choices"][0]["message"]["content"]
        .as_str()
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("invalid watsonx chat response: choices[0].message.content missing"))
}

#[async_trait]
impl LlmProvider for WatsonxProvider {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> anyhow::Result<String> {
        let token = self.iam_token().await?;
        let payload = build_chat_payload(&self.settings, messages, options);

        tracing::debug!(model = %self.settings.model_id, "sending watsonx chat request");

        let resp = self
            .client
            .post(self.chat_url())
            .bearer_auth(token)
            .header("Accept", "application/json")
            .json(&payload)
            .send()
            .await
            .context("failed to call watsonx chat API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("watsonx chat API error ({status}): {body}");
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse watsonx chat response")?;

        extract_content(&data)
    }
}
