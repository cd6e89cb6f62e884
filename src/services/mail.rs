use async_trait::async_trait;
use tracing::info;

use crate::config;
use crate::services::ServiceError;

/// Outbound account notifications
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_welcome(&self, email: &str, full_name: &str, password: &str) -> Result<(), ServiceError>;
}

/// Writes each message to the log instead of delivering it.
#[derive(Debug, Clone)]
pub struct LogMailer {
    enabled: bool,
    from: String,
}

impl LogMailer {
    pub fn from_config() -> Self {
        let mail = &config::config().mail;
        Self {
            enabled: mail.enabled,
            from: format!("{} <{}>", mail.from_name, mail.from_address),
        }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send_welcome(&self, email: &str, full_name: &str, _password: &str) -> Result<(), ServiceError> {
        if !self.enabled {
            tracing::debug!(to = email, "Mail disabled, skipping welcome message");
            return Ok(());
        }
        // credentials never reach the log
        info!(from = %self.from, to = email, name = full_name, "Queued welcome message with login credentials");
        Ok(())
    }
}

/// Collects sent messages, for tests
#[derive(Debug, Default)]
pub struct MemoryMailer {
    pub sent: std::sync::Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send_welcome(&self, email: &str, full_name: &str, _password: &str) -> Result<(), ServiceError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((email.to_string(), full_name.to_string()));
        }
        Ok(())
    }
}
