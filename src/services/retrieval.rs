use serde_json::Value;

use crate::models::{CustomerRecord, MatchResult};

const SOURCE_NAME: &str = "customer_directory";

/// Anything that can rank reference records against an email.
pub trait ContextSource: Send + Sync {
    fn find_context(&self, text: &str) -> Vec<MatchResult>;
}

/// Read-only keyword index over a fixed set of customer records.
///
/// Matching is literal case-insensitive substring containment, not tokenized:
/// a short keyword also matches inside unrelated words.
pub struct CustomerDirectory {
    customers: Vec<CustomerRecord>,
}

impl CustomerDirectory {
    pub fn new(customers: Vec<CustomerRecord>) -> Self {
        Self { customers }
    }

    pub fn len(&self) -> usize {
        self.customers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}

impl ContextSource for CustomerDirectory {
    fn find_context(&self, text: &str) -> Vec<MatchResult> {
        let haystack = text.to_lowercase();

        let mut matches: Vec<MatchResult> = self
            .customers
            .iter()
            .filter_map(|customer| {
                let matched: Vec<String> = customer
                    .keywords
                    .iter()
                    .filter(|k| haystack.contains(&k.to_lowercase()))
                    .cloned()
                    .collect();

                if matched.is_empty() {
                    return None;
                }

                let score = matched.len();
                let mut context = customer.metadata.clone();
                context.insert(
                    "matched_keywords".to_string(),
                    Value::Array(matched.into_iter().map(Value::String).collect()),
                );

                Some(MatchResult {
                    customer_id: customer.id.clone(),
                    customer_name: customer.name.clone(),
                    customer_email: customer.email_address.clone(),
                    source: SOURCE_NAME.to_string(),
                    context,
                    score,
                })
            })
            .collect();

        // Stable: equal scores keep corpus order.
        matches.sort_by(|a, b| b.score.cmp(&a.score));
        matches
    }
}
