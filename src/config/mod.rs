use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub filter: FilterConfig,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub services: ServicesConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub max_request_size_bytes: usize,
    pub max_upload_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    pub default_limit: i64,
    pub max_limit: i64,
    pub debug_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    #[serde(skip_serializing)]
    pub service_api_key: Option<String>,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesConfig {
    pub processing_url: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    pub enabled: bool,
    pub from_address: String,
    pub from_name: String,
}

/// Development-only fallback so `cargo run` works without a `.env`.
const DEV_JWT_SECRET: &str = "trackademy-development-secret";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("TRACKADEMY_PORT").or_else(|_| env::var("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Ok(v) = env::var("SERVER_MAX_REQUEST_SIZE_BYTES") {
            self.server.max_request_size_bytes = v.parse().unwrap_or(self.server.max_request_size_bytes);
        }
        if let Ok(v) = env::var("SERVER_MAX_UPLOAD_SIZE_BYTES") {
            self.server.max_upload_size_bytes = v.parse().unwrap_or(self.server.max_upload_size_bytes);
        }

        // Filter overrides
        if let Ok(v) = env::var("FILTER_DEFAULT_LIMIT") {
            self.filter.default_limit = v.parse().unwrap_or(self.filter.default_limit);
        }
        if let Ok(v) = env::var("FILTER_MAX_LIMIT") {
            self.filter.max_limit = v.parse().unwrap_or(self.filter.max_limit);
        }
        if let Ok(v) = env::var("FILTER_DEBUG_LOGGING") {
            self.filter.debug_logging = v.parse().unwrap_or(self.filter.debug_logging);
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            if !v.trim().is_empty() {
                self.database.url = Some(v);
            }
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SERVICE_API_KEY") {
            if !v.trim().is_empty() {
                self.security.service_api_key = Some(v);
            }
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        for key in ["FRONTEND_DEV_URL", "FRONTEND_PROD_URL"] {
            if let Ok(v) = env::var(key) {
                if !v.trim().is_empty() && !self.security.cors_origins.contains(&v) {
                    self.security.cors_origins.push(v);
                }
            }
        }

        // External services
        if let Ok(v) = env::var("SERVICE_URL") {
            self.services.processing_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("SERVICE_TIMEOUT_SECS") {
            self.services.request_timeout_secs = v.parse().unwrap_or(self.services.request_timeout_secs);
        }

        // Mail
        if let Ok(v) = env::var("EMAIL_ENABLED") {
            self.mail.enabled = v.parse().unwrap_or(self.mail.enabled);
        }
        if let Ok(v) = env::var("EMAIL_FROM") {
            self.mail.from_address = v;
        }
        if let Ok(v) = env::var("EMAIL_FROM_NAME") {
            self.mail.from_name = v;
        }

        self
    }

    /// Checks the settings the server cannot run without.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err("JWT_SECRET must be set".to_string());
        }
        if self.environment != Environment::Development && self.security.jwt_secret == DEV_JWT_SECRET {
            return Err("JWT_SECRET must be set outside development".to_string());
        }
        if self.database.url.is_none() {
            return Err("DATABASE_URL must be set".to_string());
        }
        if self.filter.default_limit > self.filter.max_limit {
            return Err("FILTER_DEFAULT_LIMIT cannot exceed FILTER_MAX_LIMIT".to_string());
        }
        Ok(())
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8000,
                max_request_size_bytes: 500 * 1024,
                max_upload_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            filter: FilterConfig {
                default_limit: 20,
                max_limit: 1000,
                debug_logging: true,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                service_api_key: None,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
            },
            services: ServicesConfig {
                processing_url: "http://localhost:8001".to_string(),
                request_timeout_secs: 60,
            },
            mail: MailConfig {
                enabled: false,
                from_address: "no-reply@trackademy.local".to_string(),
                from_name: "Trackademy".to_string(),
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8000,
                max_request_size_bytes: 500 * 1024,
                max_upload_size_bytes: 10 * 1024 * 1024,
            },
            filter: FilterConfig {
                default_limit: 20,
                max_limit: 500,
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                run_migrations: true,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                service_api_key: None,
                cors_origins: vec![],
            },
            services: ServicesConfig {
                processing_url: "http://localhost:8001".to_string(),
                request_timeout_secs: 60,
            },
            mail: MailConfig {
                enabled: true,
                from_address: "no-reply@trackademy.local".to_string(),
                from_name: "Trackademy".to_string(),
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8000,
                max_request_size_bytes: 500 * 1024,
                max_upload_size_bytes: 5 * 1024 * 1024, // 5MB
            },
            filter: FilterConfig {
                default_limit: 20,
                max_limit: 100,
                debug_logging: false,
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                service_api_key: None,
                cors_origins: vec![],
            },
            services: ServicesConfig {
                processing_url: "http://localhost:8001".to_string(),
                request_timeout_secs: 30,
            },
            mail: MailConfig {
                enabled: true,
                from_address: "no-reply@trackademy.local".to_string(),
                from_name: "Trackademy".to_string(),
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::config().environment, $crate::config::Environment::Development)
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::config().environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.filter.max_limit, 1000);
        assert!(!config.security.jwt_secret.is_empty());
        assert!(config.database.run_migrations);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.filter.max_limit, 100);
        assert!(config.security.jwt_secret.is_empty());
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn production_requires_secret_and_database() {
        let mut config = AppConfig::production();
        assert!(config.validate().is_err());

        config.security.jwt_secret = "a-real-secret".to_string();
        assert_eq!(config.validate(), Err("DATABASE_URL must be set".to_string()));

        config.database.url = Some("postgres://localhost/trackademy".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn development_secret_rejected_outside_development() {
        let mut config = AppConfig::staging();
        config.security.jwt_secret = DEV_JWT_SECRET.to_string();
        config.database.url = Some("postgres://localhost/trackademy".to_string());
        assert!(config.validate().is_err());
    }
}
