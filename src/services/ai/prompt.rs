use std::sync::Arc;

use crate::models::{Intent, MatchResult};
use crate::services::ai::schemas::SchemaRegistry;
use crate::services::ai::ChatMessage;

const NO_CONTEXT: &str = "No specific customer context found by the retrieval system.";

const SYSTEM_PROMPT: &str = r#"You are an AI assistant specializing in customer support email analysis. Your task is to meticulously analyze the provided email content and any supplementary customer context.
You must extract structured information and respond ONLY with a valid JSON object that adheres to the provided JSON schema corresponding to the email's determined intent.
Do NOT include any other text, explanations, apologies, or markdown formatting (like ```json) around the JSON output.
The 'summary' field in the JSON should be a concise summary of the email's main points.
The 'customer_id' field should be populated if a customer was identified from the retrieved context or can be clearly inferred from the email.
The 'automation_tasks' array should suggest relevant next steps based on the intent and content. Examples:
- Billing Dispute: [{ "action": "assign_to_billing", "priority": "high", "details": { "invoice_id": "INV-123" } }]
- Tech Support: [{ "action": "create_support_ticket", "priority": "medium", "details": { "product": "App X" } }]
- Sales Inquiry: [{ "action": "notify_sales_team", "priority": "medium", "details": { "interest": "Product Y" } }]
- Unknown: [{ "action": "manual_review_required", "priority": "high" }]"#;

/// The system/user message pair sent for one classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: ChatMessage,
    pub user: ChatMessage,
}

impl Prompt {
    pub fn into_messages(self) -> Vec<ChatMessage> {
        vec![self.system, self.user]
    }
}

pub struct PromptComposer {
    registry: Arc<SchemaRegistry>,
}

impl PromptComposer {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    pub fn compose(&self, email: &str, matches: &[MatchResult], target: Option<Intent>) -> Prompt {
        let context = render_context(matches.first());

        let (instruction, schema) = match target {
            Some(intent) if intent != Intent::Unknown => (
                format!(
                    "The primary intent of this email is likely: {intent}. Please use the following JSON schema for this intent."
                ),
                self.registry.render(intent),
            ),
            _ => (self.choose_intent_instruction(), self.all_schemas()),
        };

        let user = format!(
            r#"
**Customer Email Content:**
---
{email}
---

**Retrieved Context (if any):**
---
{context}
---

**Instructions & JSON Schema:**
1. Read the email content and any retrieved customer context carefully.
2. {instruction}
3. Ensure all fields in the chosen JSON schema are addressed. If information for a field is not present in the email, use a sensible default (e.g., null for optional fields, or a specific string like "not specified" only if the schema indicates string type for that scenario) or omit optional fields if appropriate based on the schema description. Strive for accuracy.

**JSON Schema to use:**
---
{schema}
---

Please provide your analysis as a single, raw JSON object:
"#
        );

        Prompt {
            system: ChatMessage::system(SYSTEM_PROMPT),
            user: ChatMessage::user(user),
        }
    }

    fn choose_intent_instruction(&self) -> String {
        let options: Vec<&str> = self
            .registry
            .all_intents()
            .iter()
            .map(Intent::as_str)
            .collect();
        format!(
            "First, determine the most appropriate intent for the email from the following options: {}.\nThen, populate the corresponding JSON schema. If no specific intent can be determined with high confidence, use the '{}' intent and schema.",
            options.join(", "),
            Intent::Unknown,
        )
    }

    fn all_schemas(&self) -> String {
        let examples: Vec<String> = self
            .registry
            .all_intents()
            .iter()
            .filter(|intent| **intent != Intent::Unknown)
            .map(|intent| format!("For intent '{intent}':\n{}", self.registry.render(*intent)))
            .collect();

        format!(
            "Possible JSON output schemas:\n{}\n\nSchema for '{unknown}' (use if no other intent fits well):\n{}",
            examples.join("\n\n"),
            self.registry.render(Intent::Unknown),
            unknown = Intent::Unknown,
        )
    }
}

fn render_context(top: Option<&MatchResult>) -> String {
    let Some(m) = top else {
        return NO_CONTEXT.to_string();
    };

    let details = serde_json::to_string_pretty(&m.context).unwrap_or_else(|_| "{}".to_string());
    format!(
        "Relevant Customer Context (from retrieval system):\nName: {}\nCustomer ID: {}\nEmail: {}\nDetails: {}",
        m.customer_name, m.customer_id, m.customer_email, details
    )
}
