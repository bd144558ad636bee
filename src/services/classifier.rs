use std::sync::Arc;

use crate::errors::AppError;
use crate::models::{ClassificationResult, Intent};
use crate::services::ai::intent::normalize;
use crate::services::ai::prompt::PromptComposer;
use crate::services::ai::{CompletionOptions, LlmProvider};
use crate::services::retrieval::ContextSource;

pub struct EmailClassifier {
    context: Arc<dyn ContextSource>,
    composer: PromptComposer,
    llm: Box<dyn LlmProvider>,
    options: CompletionOptions,
}

impl EmailClassifier {
    pub fn new(
        context: Arc<dyn ContextSource>,
        composer: PromptComposer,
        llm: Box<dyn LlmProvider>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            context,
            composer,
            llm,
            options,
        }
    }

    pub async fn classify(&self, email: &str) -> Result<ClassificationResult, AppError> {
        self.classify_with_hint(email, None).await
    }

    /// One retrieval, one model call, one normalization. A model call that
    /// fails is surfaced as [`AppError::Generation`]; a model answer that
    /// cannot be used becomes an `unknown` result instead.
    pub async fn classify_with_hint(
        &self,
        email: &str,
        hint: Option<Intent>,
    ) -> Result<ClassificationResult, AppError> {
        let preview: String = email.chars().take(50).collect();
        tracing::info!(preview = %preview, hint = ?hint, "classifying email");

        let matches = self.context.find_context(email);
        match matches.first() {
            Some(top) => tracing::info!(
                matches = matches.len(),
                top_customer = %top.customer_id,
                score = top.score,
                "found customer context"
            ),
            None => tracing::info!("no customer context found"),
        }

        let prompt = self.composer.compose(email, &matches, hint);

        let raw = self
            .llm
            .complete(&prompt.into_messages(), &self.options)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "model call failed");
                AppError::Generation(e)
            })?;
        tracing::debug!(raw = %raw, "model response");

        Ok(normalize(&raw, &matches))
    }
}
