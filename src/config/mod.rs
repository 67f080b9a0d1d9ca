//! # Configuration
//!
//! Settings are layered with the `config` crate: built-in defaults first,
//! then environment variables prefixed with `STORE_` (for example
//! `STORE_PORT=8080` or `STORE_DATABASE_URL=sqlite://data/store.db`).

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Locale;

/// Placeholder secret that must never reach production.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Main service configuration.
///
/// # Example
/// ```rust
/// use drinks_storefront::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.port, 3000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,

    pub port: u16,

    /// sqlx connection string
    pub database_url: String,

    pub jwt_secret: String,

    /// Lifetime of issued tokens, in hours
    pub jwt_expiration_hours: u64,

    /// Locale used when a request names none, and the fallback for
    /// missing translation keys
    pub default_locale: Locale,

    /// Requests per minute allowed per client on public write endpoints
    pub rate_limit_per_minute: u32,

    pub rate_limit_burst: u32,

    /// Take the client address from `X-Forwarded-For` / `X-Real-IP`.
    /// Only safe behind a proxy that overwrites those headers.
    #[serde(default)]
    pub trusted_proxy: bool,

    pub environment: Environment,

    /// First staff account, created at startup when no staff user exists
    #[serde(default)]
    pub admin_email: Option<String>,

    #[serde(default)]
    pub admin_password: Option<String>,
}

/// Runtime environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "dev")]
    Development,

    #[serde(alias = "test")]
    Testing,

    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: "sqlite://data/store.db?mode=rwc".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24,
            default_locale: Locale::Uz,
            rate_limit_per_minute: 30,
            rate_limit_burst: 10,
            trusted_proxy: false,
            environment: Environment::Development,
            admin_email: None,
            admin_password: None,
        }
    }
}

impl Config {
    /// Load defaults overlaid with `STORE_*` environment variables.
    ///
    /// # Errors
    /// Returns `AppError::Config` when a variable cannot be parsed into its
    /// field type or the result fails [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("database_url", defaults.database_url)?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_hours", defaults.jwt_expiration_hours as i64)?
            .set_default("default_locale", defaults.default_locale.code())?
            .set_default("rate_limit_per_minute", i64::from(defaults.rate_limit_per_minute))?
            .set_default("rate_limit_burst", i64::from(defaults.rate_limit_burst))?
            .set_default("trusted_proxy", defaults.trusted_proxy)?
            .set_default("environment", "development")?
            .add_source(config::Environment::with_prefix("STORE").try_parsing(true))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that would make the service unsafe or unusable.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::Config(
                "STORE_JWT_SECRET must be changed in production".to_string(),
            ));
        }

        if self.port == 0 {
            return Err(AppError::Config("STORE_PORT cannot be 0".to_string()));
        }

        if self.rate_limit_per_minute == 0 || self.rate_limit_burst == 0 {
            return Err(AppError::Config(
                "Rate limit settings must be greater than 0".to_string(),
            ));
        }

        if let Some(password) = &self.admin_password {
            if password.chars().count() < 8 {
                return Err(AppError::Config(
                    "STORE_ADMIN_PASSWORD must be at least 8 characters".to_string(),
                ));
            }
        }

        Ok(())
    }

    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// Builds a `Config` step by step, starting from the defaults.
///
/// # Example
/// ```rust
/// use drinks_storefront::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .host("0.0.0.0")
///     .build();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    #[must_use]
    pub fn default_locale(mut self, locale: Locale) -> Self {
        self.config.default_locale = locale;
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, per_minute: u32, burst: u32) -> Self {
        self.config.rate_limit_per_minute = per_minute;
        self.config.rate_limit_burst = burst;
        self
    }

    #[must_use]
    pub fn trusted_proxy(mut self, trusted: bool) -> Self {
        self.config.trusted_proxy = trusted;
        self
    }

    #[must_use]
    pub fn admin(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.admin_email = Some(email.into());
        self.config.admin_password = Some(password.into());
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// # Errors
    /// Fails when [`Config::validate`] fails.
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

// =====================================
// Tests
// =====================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.default_locale, Locale::Uz);
        assert!(!config.trusted_proxy);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .port(8080)
            .host("0.0.0.0")
            .default_locale(Locale::Ru)
            .build();

        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.default_locale, Locale::Ru);
    }

    #[test]
    fn test_environment_from_string() {
        assert_eq!(Environment::from("production".to_string()), Environment::Production);
        assert_eq!(Environment::from("PROD".to_string()), Environment::Production);
        assert_eq!(Environment::from("test".to_string()), Environment::Testing);
        assert_eq!(Environment::from("unknown".to_string()), Environment::Development);
    }

    #[test]
    fn test_validation_fails_in_production_with_default_secret() {
        let config = ConfigBuilder::new()
            .environment(Environment::Production)
            .build();

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_short_admin_password() {
        let result = ConfigBuilder::new()
            .admin("admin@example.com", "short")
            .build_validated();

        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
