//! Environment and file-based configuration management.
//!
//! Configuration is loaded once at startup and handed to components by
//! value; nothing here is process-global.

use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};

use crate::auth::token::TokenConfig;

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub auth: AuthConfig,
    pub logging: LoggingConfig,
}

/// Token issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Symmetric signing secret; at least 32 characters
    pub secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: u64,
    /// Refresh token lifetime in seconds; must exceed the access lifetime
    pub refresh_token_ttl_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            auth: AuthConfig {
                secret: "campus-auth-dev-secret-change-in-production".to_string(),
                access_token_ttl_secs: 60 * 60,            // 1 hour
                refresh_token_ttl_secs: 7 * 24 * 60 * 60,  // 7 days
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "json".to_string(),
            },
        }
    }
}

impl AppConfig {
    /// Load configuration, environment variables (prefix `CAMPUS`) overriding
    /// optional `config/default` and `config/local` files.
    pub fn load() -> Result<Self, ConfigError> {
        if std::path::Path::new(".env").exists() {
            dotenvy::dotenv().ok();
        }

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CAMPUS").separator("_"));

        builder.build()?.try_deserialize()
    }

    /// Load configuration from an explicit file path.
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("CAMPUS").separator("_"));

        builder.build()?.try_deserialize()
    }

    /// Validate invariants that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.auth.secret.len() < 32 {
            return Err("auth secret must be at least 32 characters long".to_string());
        }
        if self.auth.access_token_ttl_secs >= self.auth.refresh_token_ttl_secs {
            return Err("access token lifetime must be shorter than refresh lifetime".to_string());
        }
        Ok(())
    }
}

impl AuthConfig {
    /// Resolve into the codec's configuration object.
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.secret.clone(),
            access_token_ttl: Duration::from_secs(self.access_token_ttl_secs),
            refresh_token_ttl: Duration::from_secs(self.refresh_token_ttl_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_token_ttl_secs, 604_800);
    }

    #[test]
    fn validation_rejects_short_secret_and_inverted_ttls() {
        let mut config = AppConfig::default();
        config.auth.secret = "short".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.auth.access_token_ttl_secs = config.auth.refresh_token_ttl_secs;
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_config_durations() {
        let config = AppConfig::default();
        let token_config = config.auth.token_config();
        assert_eq!(token_config.access_token_ttl, Duration::from_secs(3600));
        assert!(token_config.access_token_ttl < token_config.refresh_token_ttl);
    }

    #[test]
    fn load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("campus.yml");

        let yaml = r#"
auth:
  secret: "file-provided-secret-that-is-long-enough!!"
  access_token_ttl_secs: 1800
  refresh_token_ttl_secs: 86400
logging:
  level: "debug"
  format: "plain"
"#;
        fs::write(&config_path, yaml).unwrap();

        let config = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(config.auth.access_token_ttl_secs, 1800);
        assert_eq!(config.logging.level, "debug");
        assert!(config.validate().is_ok());
    }
}
