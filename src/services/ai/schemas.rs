//! Per-intent output schemas as the model sees them.
//!
//! These are prompt text, not validators: each field maps to a descriptive
//! placeholder that is rendered verbatim into the user message. Decoding the
//! model's answer is handled separately by the typed
//! [`ClassificationResult`](crate::models::ClassificationResult).

use std::collections::HashMap;

use crate::models::Intent;

const CUSTOMER_ID: &str = "C-XXXX (if identified)";
const EXAMPLE_TASKS: &str = r#"[{ action: "example_action", priority: "medium" }, ...]"#;

#[derive(Debug, Clone)]
pub struct IntentSchema {
    intent: Intent,
    fields: Vec<(String, String)>,
}

impl IntentSchema {
    fn new(intent: Intent, fields: &[(&str, &str)]) -> Self {
        let mut all = vec![("intent".to_string(), intent.as_str().to_string())];
        all.extend(fields.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        Self { intent, fields: all }
    }

    pub fn intent(&self) -> Intent {
        self.intent
    }

    /// Field name and placeholder pairs, `intent` first.
    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Two-space indented JSON object text.
    pub fn render(&self) -> String {
        let body: Vec<String> = self
            .fields()
            .iter()
            .map(|(name, placeholder)| format!("  {}: {}", quote(name), quote(placeholder)))
            .collect();
        format!("{{\n{}\n}}", body.join(",\n"))
    }
}

fn quote(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

pub struct SchemaRegistry {
    intents: Vec<Intent>,
    schemas: HashMap<Intent, IntentSchema>,
}

impl SchemaRegistry {
    pub fn new(schemas: Vec<IntentSchema>) -> Self {
        let intents = schemas.iter().map(IntentSchema::intent).collect();
        let schemas = schemas.into_iter().map(|s| (s.intent(), s)).collect();
        Self { intents, schemas }
    }

    /// The schemas for the four support intents.
    pub fn standard() -> Self {
        Self::new(vec![
            IntentSchema::new(
                Intent::BillingDispute,
                &[
                    ("customer_id", CUSTOMER_ID),
                    ("summary", "Brief summary of the billing dispute."),
                    (
                        "dispute_type",
                        "overcharge | unrecognized_charge | service_not_rendered | other",
                    ),
                    ("amount_disputed", "Number (e.g., 100) (optional)"),
                    ("invoice_number", "String (e.g., INV-12345) (optional)"),
                    (
                        "desired_resolution",
                        "String (e.g., refund, correction) (optional)",
                    ),
                    ("automation_tasks", EXAMPLE_TASKS),
                ],
            ),
            IntentSchema::new(
                Intent::TechSupport,
                &[
                    ("customer_id", CUSTOMER_ID),
                    ("summary", "Brief summary of the technical issue."),
                    ("product_or_service", "String (e.g., App X, Website Login)"),
                    ("issue_description", "Detailed description of the problem."),
                    ("urgency", "critical | high | medium | low"),
                    (
                        "troubleshooting_steps_taken",
                        "String (e.g., Restarted device, cleared cache) (optional)",
                    ),
                    ("automation_tasks", EXAMPLE_TASKS),
                ],
            ),
            IntentSchema::new(
                Intent::SalesInquiry,
                &[
                    ("customer_id", CUSTOMER_ID),
                    ("summary", "Brief summary of the sales inquiry."),
                    (
                        "product_of_interest",
                        "String (e.g., Product Y, Service Z) (optional)",
                    ),
                    (
                        "inquiry_type",
                        "feature_request | pricing | demo_request | custom_solution | other",
                    ),
                    ("company_size", "Number (optional)"),
                    (
                        "potential_value",
                        "String (e.g., 10k-50k, Undetermined) (optional)",
                    ),
                    ("automation_tasks", EXAMPLE_TASKS),
                ],
            ),
            IntentSchema::new(
                Intent::Unknown,
                &[
                    (
                        "customer_id",
                        "C-XXXX (if identified, but may not be relevant)",
                    ),
                    (
                        "summary",
                        "Summary of why the email intent is unclear or could not be determined.",
                    ),
                    (
                        "reason_for_unknown",
                        "e.g., Email content too vague, Multiple conflicting intents",
                    ),
                    (
                        "automation_tasks",
                        r#"[{ action: "manual_review_required", priority: "high" }]"#,
                    ),
                ],
            ),
        ])
    }

    pub fn all_intents(&self) -> &[Intent] {
        &self.intents
    }

    /// Falls back to the `unknown` schema for an unregistered intent.
    pub fn field_spec(&self, intent: Intent) -> Option<&IntentSchema> {
        self.schemas
            .get(&intent)
            .or_else(|| self.schemas.get(&Intent::Unknown))
    }

    pub fn render(&self, intent: Intent) -> String {
        self.field_spec(intent)
            .map(IntentSchema::render)
            .unwrap_or_default()
    }
}
