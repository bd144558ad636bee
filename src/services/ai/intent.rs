use serde_json::{json, Value};

use crate::models::{
    AutomationTask, ClassificationResult, Intent, Lenient, MatchResult, UnknownIntent,
};

pub const INVALID_JSON_REASON: &str =
    "model output was not valid JSON or did not match expected structure";
pub const INVALID_INTENT_REASON: &str = "model response had missing or invalid intent field";

/// Turn raw model text into a classification. Never fails: anything that
/// cannot be trusted becomes an `unknown` result flagged for manual review.
///
/// Once the intent is valid the payload is returned as sent. Only fields of
/// other intents are dropped; nothing else is checked.
pub fn normalize(raw: &str, matches: &[MatchResult]) -> ClassificationResult {
    let top_customer = matches.first().map(|m| m.customer_id.clone());
    let extracted = extract_json_block(raw);

    let mut value: Value = match serde_json::from_str(extracted) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(error = %e, output = extracted, "model output is not valid JSON, using fallback");
            return invalid_json_fallback(top_customer);
        }
    };

    let intent = value
        .get("intent")
        .and_then(Value::as_str)
        .and_then(|s| s.parse::<Intent>().ok());

    if intent.is_none() {
        tracing::warn!(payload = %value, "model response has missing or invalid intent, using fallback");
        let customer_id = payload_customer_id(&value)
            .map(Lenient::from_value)
            .or_else(|| top_customer.map(Lenient::Typed));
        return ClassificationResult::Unknown(UnknownIntent {
            customer_id,
            summary: None,
            reason_for_unknown: Some(Lenient::Typed(INVALID_INTENT_REASON.to_string())),
            automation_tasks: Lenient::Typed(vec![Lenient::Typed(AutomationTask::manual_review())]),
        });
    }

    if payload_customer_id(&value).is_none() {
        if let (Some(id), Some(obj)) = (top_customer.as_ref(), value.as_object_mut()) {
            obj.insert("customer_id".to_string(), Value::String(id.clone()));
        }
    }

    // Every variant field accepts any JSON value, so only a non-object
    // payload could get here and fail; the intent check above rules that out.
    match serde_json::from_value::<ClassificationResult>(value) {
        Ok(result) => {
            tracing::info!(intent = %result.intent(), customer_id = ?result.customer_id(), "parsed model response");
            result
        }
        Err(e) => {
            tracing::warn!(error = %e, "model response could not be decoded, using fallback");
            invalid_json_fallback(top_customer)
        }
    }
}

/// Pull the JSON payload out of markdown fencing, preferring a `json` tagged
/// block over an untagged one. Returns the trimmed raw text when neither exists.
pub fn extract_json_block(raw: &str) -> &str {
    fenced(raw, "```json")
        .or_else(|| fenced(raw, "```"))
        .unwrap_or(raw)
        .trim()
}

fn fenced<'a>(raw: &'a str, open: &str) -> Option<&'a str> {
    let start = raw.find(open)? + open.len();
    let rest = &raw[start..];
    let end = rest.find("```")?;
    Some(&rest[..end])
}

/// Missing, null and empty-string ids count as absent; any other value is
/// the model's answer and is kept.
fn payload_customer_id(value: &Value) -> Option<Value> {
    match value.get("customer_id")? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn invalid_json_fallback(customer_id: Option<String>) -> ClassificationResult {
    let details = json!({ "error": "invalid JSON from model" });
    ClassificationResult::Unknown(UnknownIntent {
        customer_id: customer_id.map(Lenient::Typed),
        summary: None,
        reason_for_unknown: Some(Lenient::Typed(INVALID_JSON_REASON.to_string())),
        automation_tasks: Lenient::Typed(vec![Lenient::Typed(AutomationTask {
            details: details.as_object().cloned(),
            ..AutomationTask::manual_review()
        })]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerRecord, InquiryType, Priority, TechSupport, Urgency};
    use crate::services::retrieval::{ContextSource, CustomerDirectory};

    fn mike() -> Vec<MatchResult> {
        CustomerDirectory::new(CustomerRecord::seed()).find_context("login issue for mike rodriguez")
    }

    fn unknown(result: ClassificationResult) -> UnknownIntent {
        match result {
            ClassificationResult::Unknown(u) => u,
            other => panic!("expected unknown, got {other:?}"),
        }
    }

    #[test]
    fn test_extract_json_tagged_block() {
        let raw = "Sorry, here's the JSON:\n```json\n{\"a\":1}\n```\nthanks";
        assert_eq!(extract_json_block(raw), "{\"a\":1}");
    }

    #[test]
    fn test_extract_prefers_tagged_block() {
        let raw = "```\nnot this\n```\n```json\n{\"b\":2}\n```";
        assert_eq!(extract_json_block(raw), "{\"b\":2}");
    }

    #[test]
    fn test_extract_plain_block() {
        let raw = "```\n  {\"c\":3}  \n```";
        assert_eq!(extract_json_block(raw), "{\"c\":3}");
    }

    #[test]
    fn test_extract_unfenced_is_trimmed() {
        assert_eq!(extract_json_block("  {\"d\":4}\n"), "{\"d\":4}");
        assert_eq!(extract_json_block("```json {\"open\":true}"), "```json {\"open\":true}");
    }

    #[test]
    fn test_fenced_sales_inquiry() {
        let raw = "Sorry, here's the JSON:\n```json\n{\"intent\":\"sales_inquiry\",\"inquiry_type\":\"pricing\",\"automation_tasks\":[]}\n```";
        match normalize(raw, &[]) {
            ClassificationResult::SalesInquiry(s) => {
                assert_eq!(s.inquiry_type, Some(Lenient::Typed(InquiryType::Pricing)));
                assert_eq!(s.automation_tasks, Lenient::Typed(vec![]));
                assert_eq!(s.customer_id, None);
            }
            other => panic!("expected sales_inquiry, got {other:?}"),
        }
    }

    #[test]
    fn test_tech_support_fields_kept_and_customer_backfilled() {
        let raw = r#"```json
{
  "intent": "tech_support",
  "summary": "Cannot log in",
  "product_or_service": "Website Login",
  "issue_description": "Password reset link never arrives",
  "urgency": "high",
  "troubleshooting_steps_taken": "Cleared cache",
  "automation_tasks": [{"action": "create_support_ticket", "priority": "medium", "details": {"product": "Website Login"}}]
}
```"#;
        let result = normalize(raw, &mike());

        let text = |s: &str| Some(Lenient::Typed(s.to_string()));
        let expected = ClassificationResult::TechSupport(TechSupport {
            customer_id: text("C-2088"),
            summary: text("Cannot log in"),
            product_or_service: text("Website Login"),
            issue_description: text("Password reset link never arrives"),
            urgency: Some(Lenient::Typed(Urgency::High)),
            troubleshooting_steps_taken: text("Cleared cache"),
            automation_tasks: Lenient::Typed(vec![Lenient::Typed(AutomationTask {
                action: "create_support_ticket".to_string(),
                priority: Priority::Medium.into(),
                details: json!({"product": "Website Login"}).as_object().cloned(),
            })]),
        });
        assert_eq!(result, expected);
    }

    #[test]
    fn test_model_customer_id_not_overwritten() {
        let raw = r#"{"intent":"billing_dispute","customer_id":"C-1001","dispute_type":"overcharge"}"#;
        let result = normalize(raw, &mike());
        assert_eq!(result.intent(), Intent::BillingDispute);
        assert_eq!(result.customer_id(), Some("C-1001"));
    }

    #[test]
    fn test_empty_customer_id_is_backfilled() {
        let raw = r#"{"intent":"billing_dispute","customer_id":"","dispute_type":"overcharge"}"#;
        assert_eq!(normalize(raw, &mike()).customer_id(), Some("C-2088"));

        let raw = r#"{"intent":"billing_dispute","customer_id":null}"#;
        assert_eq!(normalize(raw, &mike()).customer_id(), Some("C-2088"));
    }

    #[test]
    fn test_not_json() {
        let result = normalize("not json at all", &[]);
        let tasks: Vec<&AutomationTask> = result.well_formed_tasks().collect();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].action, "manual_review_required");
        assert_eq!(tasks[0].priority, Lenient::Typed(Priority::High));
        assert_eq!(
            tasks[0].details.as_ref().unwrap()["error"],
            "invalid JSON from model"
        );

        let result = unknown(result);
        assert_eq!(result.reason_for_unknown, Some(Lenient::Typed(INVALID_JSON_REASON.to_string())));
        assert_eq!(result.customer_id, None);
    }

    #[test]
    fn test_not_json_uses_top_match() {
        let result = normalize("I could not decide", &mike());
        assert_eq!(result.intent(), Intent::Unknown);
        assert_eq!(result.customer_id(), Some("C-2088"));
    }

    #[test]
    fn test_invalid_intent_keeps_payload_customer() {
        let raw = r#"{"intent":"refund","customer_id":"C-9999"}"#;
        let result = normalize(raw, &mike());
        assert_eq!(result.customer_id(), Some("C-9999"));

        let result = unknown(result);
        assert_eq!(result.reason_for_unknown, Some(Lenient::Typed(INVALID_INTENT_REASON.to_string())));
        assert_eq!(
            result.automation_tasks,
            Lenient::Typed(vec![Lenient::Typed(AutomationTask::manual_review())])
        );
    }

    #[test]
    fn test_invalid_intent_keeps_non_string_customer() {
        let raw = r#"{"intent":"refund","customer_id":9999}"#;
        let value = serde_json::to_value(normalize(raw, &mike())).unwrap();
        assert_eq!(value["intent"], "unknown");
        assert_eq!(value["customer_id"], 9999);
    }

    #[test]
    fn test_missing_intent_uses_top_match() {
        let result = normalize(r#"{"summary":"?"}"#, &mike());
        assert_eq!(result.customer_id(), Some("C-2088"));
        let result = unknown(result);
        assert_eq!(result.reason_for_unknown, Some(Lenient::Typed(INVALID_INTENT_REASON.to_string())));
    }

    #[test]
    fn test_non_object_json_is_invalid_intent() {
        let result = unknown(normalize("42", &[]));
        assert_eq!(result.reason_for_unknown, Some(Lenient::Typed(INVALID_INTENT_REASON.to_string())));
        assert_eq!(result.customer_id, None);
    }

    #[test]
    fn test_unknown_without_context_has_no_customer() {
        let raw = r#"{"intent":"unknown","reason_for_unknown":"Email content too vague","automation_tasks":[{"action":"manual_review_required","priority":"high"}]}"#;
        let result = unknown(normalize(raw, &[]));

        assert_eq!(result.customer_id, None);
        assert_eq!(result.reason_for_unknown, Some(Lenient::Typed("Email content too vague".to_string())));
    }

    #[test]
    fn test_unexpected_field_values_pass_through() {
        let raw = r#"{
            "intent": "sales_inquiry",
            "company_size": "not specified",
            "inquiry_type": "partnership",
            "automation_tasks": [{"action": "notify_sales", "priority": "urgent"}]
        }"#;
        let result = normalize(raw, &mike());
        assert_eq!(result.intent(), Intent::SalesInquiry);
        assert_eq!(result.customer_id(), Some("C-2088"));

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["company_size"], "not specified");
        assert_eq!(value["inquiry_type"], "partnership");
        assert_eq!(value["automation_tasks"][0]["action"], "notify_sales");
        assert_eq!(value["automation_tasks"][0]["priority"], "urgent");
    }

    #[test]
    fn test_unlisted_dispute_values_are_not_rewritten() {
        let raw = r#"{"intent":"billing_dispute","dispute_type":"double_billing","amount_disputed":"$45.50","urgency":"high"}"#;
        let result = normalize(raw, &[]);
        assert_eq!(result.intent(), Intent::BillingDispute);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["dispute_type"], "double_billing");
        assert_eq!(value["amount_disputed"], "$45.50");
        assert!(value.get("urgency").is_none());
    }

    #[test]
    fn test_unexpected_urgency_keeps_tech_support() {
        let raw = r#"{"intent":"tech_support","urgency":"whenever","automation_tasks":"open a ticket"}"#;
        let result = normalize(raw, &mike());
        assert_eq!(result.intent(), Intent::TechSupport);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["urgency"], "whenever");
        assert_eq!(value["automation_tasks"], "open a ticket");
        assert_eq!(value["customer_id"], "C-2088");
    }

    #[test]
    fn test_normalizing_its_own_output_is_stable() {
        let raw = r#"{"intent":"tech_support","urgency":"critical","summary":"Outage","automation_tasks":[{"action":"page_oncall","priority":"high"}]}"#;
        let first = normalize(raw, &mike());
        let again = normalize(&serde_json::to_string(&first).unwrap(), &mike());
        assert_eq!(first, again);
    }

    #[test]
    fn test_arbitrary_text_always_yields_known_intent() {
        let inputs = [
            "",
            "```",
            "``````",
            "{",
            "null",
            "[]",
            r#"{"intent":null}"#,
            r#"{"intent":5}"#,
            "```json\n{\"intent\":\"tech_support\"}\n```",
        ];
        for raw in inputs {
            let result = normalize(raw, &[]);
            assert!(Intent::ALL.contains(&result.intent()), "input: {raw:?}");
            if result.intent() == Intent::Unknown {
                assert_eq!(result.well_formed_tasks().count(), 1, "input: {raw:?}");
            }
        }
    }
}
