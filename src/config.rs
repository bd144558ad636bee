use std::env;
use std::path::PathBuf;

use crate::errors::AppError;
use crate::services::ai::watsonx::{WatsonxSettings, DEFAULT_IAM_URL};
use crate::services::ai::CompletionOptions;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub llm_provider: String,
    pub watson_api_key: String,
    pub watson_project_id: String,
    pub watson_model_id: String,
    pub watson_endpoint: String,
    pub watson_iam_url: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub llm_temperature: Option<f32>,
    pub llm_max_tokens: Option<u32>,
    pub llm_top_p: Option<f32>,
    pub customers_file: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            llm_provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "watsonx".to_string()),
            watson_api_key: env::var("WATSON_API_KEY").unwrap_or_default(),
            watson_project_id: env::var("WATSON_PROJECT_ID").unwrap_or_default(),
            watson_model_id: env::var("WATSON_MODEL_ID").unwrap_or_default(),
            watson_endpoint: env::var("WATSON_ENDPOINT").unwrap_or_default(),
            watson_iam_url: env::var("WATSON_IAM_URL")
                .unwrap_or_else(|_| DEFAULT_IAM_URL.to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            llm_temperature: env::var("LLM_TEMPERATURE").ok().and_then(|v| v.parse().ok()),
            llm_max_tokens: env::var("LLM_MAX_TOKENS").ok().and_then(|v| v.parse().ok()),
            llm_top_p: env::var("LLM_TOP_P").ok().and_then(|v| v.parse().ok()),
            customers_file: env::var("CUSTOMERS_FILE").ok().map(PathBuf::from),
        }
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.llm_temperature,
            max_tokens: self.llm_max_tokens,
            top_p: self.llm_top_p,
            stop_sequences: Vec::new(),
        }
    }

    pub fn watsonx_settings(&self) -> Result<WatsonxSettings, AppError> {
        let missing: Vec<&str> = [
            ("WATSON_API_KEY", &self.watson_api_key),
            ("WATSON_PROJECT_ID", &self.watson_project_id),
            ("WATSON_MODEL_ID", &self.watson_model_id),
            ("WATSON_ENDPOINT", &self.watson_endpoint),
        ]
        .iter()
        .filter(|(_, v)| v.is_empty())
        .map(|(name, _)| *name)
        .collect();

        if !missing.is_empty() {
            return Err(AppError::Config(format!(
                "watsonx provider requires {}",
                missing.join(", ")
            )));
        }

        Ok(WatsonxSettings {
            api_key: self.watson_api_key.clone(),
            project_id: self.watson_project_id.clone(),
            model_id: self.watson_model_id.clone(),
            endpoint: self.watson_endpoint.clone(),
            iam_url: self.watson_iam_url.clone(),
        })
    }
}
