use crate::config::AppConfig;
use crate::services::classifier::EmailClassifier;

pub struct AppState {
    pub config: AppConfig,
    pub classifier: EmailClassifier,
}
