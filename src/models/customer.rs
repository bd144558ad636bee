use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// An entry in the retrieval corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub id: String,
    pub name: String,
    pub email_address: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// A corpus record that matched an email, with its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub customer_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub source: String,
    pub context: Map<String, Value>,
    pub score: usize,
}

impl CustomerRecord {
    pub fn load_all(path: &Path) -> anyhow::Result<Vec<CustomerRecord>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read customers file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse customers file {}", path.display()))
    }

    pub fn seed() -> Vec<CustomerRecord> {
        vec![
            CustomerRecord {
                id: "C-1001".to_string(),
                name: "Sarah Chen".to_string(),
                email_address: "sarah.chen@example.com".to_string(),
                metadata: metadata(json!({
                    "join_date": "2023-01-15",
                    "plan": "Premium",
                    "total_spent": 1250,
                    "last_interaction": "2024-05-10",
                    "open_tickets": 1,
                })),
                keywords: keywords(&[
                    "sarah chen",
                    "invoice SC-2024-003",
                    "premium plan upgrade",
                    "C-1001",
                    "subscription query",
                ]),
            },
            CustomerRecord {
                id: "C-2088".to_string(),
                name: "Mike Rodriguez".to_string(),
                email_address: "mike.rodriguez@example.com".to_string(),
                metadata: metadata(json!({
                    "join_date": "2022-11-05",
                    "plan": "Basic",
                    "total_spent": 350,
                    "last_interaction": "2024-04-20",
                    "open_tickets": 0,
                })),
                keywords: keywords(&[
                    "mike rodriguez",
                    "order MR-2023-789",
                    "login issue",
                    "C-2088",
                    "password reset",
                    "technical assistance",
                ]),
            },
            CustomerRecord {
                id: "C-3021".to_string(),
                name: "Jennifer Park".to_string(),
                email_address: "jennifer.park@example.com".to_string(),
                metadata: metadata(json!({
                    "join_date": "2023-07-30",
                    "plan": "Enterprise Trial",
                    "total_spent": 0,
                    "last_interaction": "2024-05-25",
                    "open_tickets": 2,
                })),
                keywords: keywords(&[
                    "jennifer park",
                    "quote QP-2024-015",
                    "enterprise features",
                    "C-3021",
                    "sales inquiry",
                    "product demo",
                    "trial extension",
                ]),
            },
        ]
    }
}

fn metadata(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn keywords(list: &[&str]) -> Vec<String> {
    list.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_ids_unique() {
        let seed = CustomerRecord::seed();
        let mut ids: Vec<&str> = seed.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), seed.len());
    }

    #[test]
    fn test_record_from_json_defaults() {
        let json = r#"[{"id":"C-1","name":"Ada","email_address":"ada@example.com"}]"#;
        let records: Vec<CustomerRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(records[0].id, "C-1");
        assert!(records[0].metadata.is_empty());
        assert!(records[0].keywords.is_empty());
    }

    #[test]
    fn test_load_all_missing_file() {
        let err = CustomerRecord::load_all(Path::new("/nonexistent/customers.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read customers file"));
    }
}
