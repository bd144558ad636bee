use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    BillingDispute,
    TechSupport,
    SalesInquiry,
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::BillingDispute,
        Intent::TechSupport,
        Intent::SalesInquiry,
        Intent::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::BillingDispute => "billing_dispute",
            Intent::TechSupport => "tech_support",
            Intent::SalesInquiry => "sales_inquiry",
            Intent::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == s)
            .ok_or_else(|| format!("unknown intent: {s}"))
    }
}

/// A value the model supplied for a schema field.
///
/// `Typed` when it has the expected shape, otherwise kept verbatim as `Raw`.
/// Either way it serializes back exactly as the model sent it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Lenient<T> {
    Typed(T),
    Raw(Value),
}

impl<T> Lenient<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            Lenient::Typed(t) => Some(t),
            Lenient::Raw(_) => None,
        }
    }
}

impl<T: DeserializeOwned> Lenient<T> {
    pub fn from_value(value: Value) -> Self {
        match serde_json::from_value(value.clone()) {
            Ok(t) => Lenient::Typed(t),
            Err(_) => Lenient::Raw(value),
        }
    }
}

impl<T: Default> Default for Lenient<T> {
    fn default() -> Self {
        Lenient::Typed(T::default())
    }
}

impl<T> From<T> for Lenient<T> {
    fn from(t: T) -> Self {
        Lenient::Typed(t)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

/// Tasks with keys outside this shape stay `Raw` so nothing is lost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AutomationTask {
    pub action: String,
    pub priority: Lenient<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
}

impl AutomationTask {
    pub fn manual_review() -> Self {
        Self {
            action: "manual_review_required".to_string(),
            priority: Priority::High.into(),
            details: None,
        }
    }
}

pub type TaskList = Lenient<Vec<Lenient<AutomationTask>>>;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisputeType {
    Overcharge,
    UnrecognizedCharge,
    ServiceNotRendered,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Critical,
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InquiryType {
    FeatureRequest,
    Pricing,
    DemoRequest,
    CustomSolution,
    Other,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BillingDispute {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispute_type: Option<Lenient<DisputeType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_disputed: Option<Lenient<Number>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desired_resolution: Option<Lenient<String>>,
    #[serde(default)]
    pub automation_tasks: TaskList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TechSupport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_or_service: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_description: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Lenient<Urgency>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub troubleshooting_steps_taken: Option<Lenient<String>>,
    #[serde(default)]
    pub automation_tasks: TaskList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SalesInquiry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_of_interest: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inquiry_type: Option<Lenient<InquiryType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<Lenient<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potential_value: Option<Lenient<String>>,
    #[serde(default)]
    pub automation_tasks: TaskList,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UnknownIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Lenient<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_for_unknown: Option<Lenient<String>>,
    #[serde(default)]
    pub automation_tasks: TaskList,
}

/// Structured outcome of classifying one email.
///
/// Serialized as a flat JSON object tagged by `intent`. Fields the model emits
/// that do not belong to the tagged variant are dropped on decode; fields that
/// do belong are kept as sent, whatever their shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ClassificationResult {
    BillingDispute(BillingDispute),
    TechSupport(TechSupport),
    SalesInquiry(SalesInquiry),
    Unknown(UnknownIntent),
}

impl ClassificationResult {
    pub fn intent(&self) -> Intent {
        match self {
            ClassificationResult::BillingDispute(_) => Intent::BillingDispute,
            ClassificationResult::TechSupport(_) => Intent::TechSupport,
            ClassificationResult::SalesInquiry(_) => Intent::SalesInquiry,
            ClassificationResult::Unknown(_) => Intent::Unknown,
        }
    }

    /// The customer id when the model gave it as a string.
    pub fn customer_id(&self) -> Option<&str> {
        let id = match self {
            ClassificationResult::BillingDispute(r) => r.customer_id.as_ref(),
            ClassificationResult::TechSupport(r) => r.customer_id.as_ref(),
            ClassificationResult::SalesInquiry(r) => r.customer_id.as_ref(),
            ClassificationResult::Unknown(r) => r.customer_id.as_ref(),
        };
        id.and_then(Lenient::typed).map(String::as_str)
    }

    pub fn automation_tasks(&self) -> &TaskList {
        match self {
            ClassificationResult::BillingDispute(r) => &r.automation_tasks,
            ClassificationResult::TechSupport(r) => &r.automation_tasks,
            ClassificationResult::SalesInquiry(r) => &r.automation_tasks,
            ClassificationResult::Unknown(r) => &r.automation_tasks,
        }
    }

    /// Tasks that have the documented `{action, priority, details?}` shape.
    pub fn well_formed_tasks(&self) -> impl Iterator<Item = &AutomationTask> {
        self.automation_tasks()
            .typed()
            .into_iter()
            .flatten()
            .filter_map(Lenient::typed)
    }
}
