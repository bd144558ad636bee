pub mod ai;
pub mod classifier;
pub mod retrieval;
