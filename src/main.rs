use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use contextflow::config::AppConfig;
use contextflow::handlers;
use contextflow::models::CustomerRecord;
use contextflow::services::ai::groq::GroqProvider;
use contextflow::services::ai::ollama::OllamaProvider;
use contextflow::services::ai::prompt::PromptComposer;
use contextflow::services::ai::schemas::SchemaRegistry;
use contextflow::services::ai::watsonx::WatsonxProvider;
use contextflow::services::ai::LlmProvider;
use contextflow::services::classifier::EmailClassifier;
use contextflow::services::retrieval::CustomerDirectory;
use contextflow::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let customers = match &config.customers_file {
        Some(path) => CustomerRecord::load_all(path)?,
        None => CustomerRecord::seed(),
    };
    let directory = CustomerDirectory::new(customers);
    tracing::info!("loaded {} customer record(s)", directory.len());

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(config.groq_api_key.clone(), config.groq_model.clone()))
        }
        "ollama" => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(config.ollama_url.clone(), config.ollama_model.clone()))
        }
        _ => {
            let settings = config.watsonx_settings()?;
            tracing::info!("using watsonx LLM provider (model: {})", settings.model_id);
            Box::new(WatsonxProvider::new(settings)?)
        }
    };

    let classifier = EmailClassifier::new(
        Arc::new(directory),
        PromptComposer::new(Arc::new(SchemaRegistry::standard())),
        llm,
        config.completion_options(),
    );

    let state = Arc::new(AppState {
        config: config.clone(),
        classifier,
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ai/parse-email", post(handlers::ai::parse_email))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
