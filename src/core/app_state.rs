use std::sync::Arc;

use crate::core::config::AutomationConfig;
use crate::storage::Database;
use crate::supervisor::Supervisor;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub supervisor: Arc<Supervisor>,
    /// File-based config loaded from `apply-scout.json` (env-var fallback for all fields).
    pub config: Arc<AutomationConfig>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("running", &self.supervisor.is_running())
            .field("captcha_key_configured", &self.config.resolve_captcha_api_key().is_some())
            .finish()
    }
}

impl AppState {
    pub fn new(db: Database, supervisor: Arc<Supervisor>) -> Self {
        Self {
            db,
            supervisor,
            config: Arc::new(AutomationConfig::default()),
        }
    }

    pub fn with_config(mut self, config: Arc<AutomationConfig>) -> Self {
        self.config = config;
        self
    }
}
