pub mod customer;
pub mod intent;

pub use customer::{CustomerRecord, MatchResult};
pub use intent::{
    AutomationTask, BillingDispute, ClassificationResult, DisputeType, InquiryType, Intent,
    Lenient, Priority, SalesInquiry, TaskList, TechSupport, UnknownIntent, Urgency,
};
