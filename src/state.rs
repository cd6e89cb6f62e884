use std::sync::Arc;

use crate::database::Database;
use crate::services::mail::{LogMailer, Mailer};
use crate::services::processing::ProcessingClient;

/// Shared handles every handler receives through axum `State`
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub mailer: Arc<dyn Mailer>,
    pub processing: Arc<ProcessingClient>,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            mailer: Arc::new(LogMailer::from_config()),
            processing: Arc::new(ProcessingClient::from_config()),
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
