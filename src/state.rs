// src/state.rs
use std::sync::Arc;

use crate::auth::email_change::EmailChangeService;
use crate::config::AppConfig;
use crate::db::connection::Database;
use crate::events::IdentityEvents;
use crate::mailer::CodeMailer;

/// Everything a request handler needs, shared by all workers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub events: Arc<IdentityEvents>,
    pub email_change: Arc<EmailChangeService>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig, mailer: Arc<dyn CodeMailer>) -> Self {
        let events = Arc::new(IdentityEvents::new());
        let email_change = Arc::new(EmailChangeService::new(
            config.email_change_ttl_secs,
            mailer,
            events.clone(),
        ));
        Self {
            db,
            config: Arc::new(config),
            events,
            email_change,
        }
    }
}
