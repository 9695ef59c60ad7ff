use std::{env, net::IpAddr, str::FromStr, time::Duration};

use log::debug;
use serde::Deserialize;

use crate::clients::LogStack;
use crate::errors::ConfigError;
use crate::services::RegistrySettings;
use crate::validations::ValidationRules;

// Server-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub workers: usize,
    /// Origin of the form page allowed to call the API
    pub cors_allowed_origin: String,
}

// Application-specific configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
    pub environment: Environment,
    pub log_level: String,
}

// Environment enum for different deployment environments
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Testing,
    Production,
}

// Implement FromStr trait for Environment enum to enable parsing from string
impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "testing" | "test" => Ok(Environment::Testing),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(format!(
                "Invalid environment: {}. Must be one of: development, testing, production",
                s
            )),
        }
    }
}

// Result type for configuration functions
type ConfigResult<T> = Result<T, ConfigError>;

// Shortening rules
#[derive(Debug, Clone, Deserialize)]
pub struct ShortenerConfig {
    /// Prefix of the short URLs handed back to the form
    pub base_url: String,
    pub default_validity_minutes: u32,
    pub max_batch_size: usize,
    pub code_length: usize,
    pub custom_code_min_length: usize,
    pub custom_code_max_length: usize,
    pub max_generation_attempts: usize,
}

impl Default for ShortenerConfig {
    fn default() -> Self {
        let rules = ValidationRules::default();
        let registry = RegistrySettings::default();
        Self {
            base_url: "http://localhost:5000".to_string(),
            default_validity_minutes: 30,
            max_batch_size: 5,
            code_length: registry.code_length,
            custom_code_min_length: rules.custom_code_min_length,
            custom_code_max_length: rules.custom_code_max_length,
            max_generation_attempts: registry.max_generation_attempts,
        }
    }
}

impl ShortenerConfig {
    /// Rejects combinations the shortener cannot work with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_validity_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHORTENER_DEFAULT_VALIDITY_MINUTES",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHORTENER_MAX_BATCH_SIZE",
                reason: "must be positive".to_string(),
            });
        }
        if self.code_length == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHORTENER_CODE_LENGTH",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_generation_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SHORTENER_MAX_GENERATION_ATTEMPTS",
                reason: "must be positive".to_string(),
            });
        }
        if self.custom_code_min_length == 0 || self.custom_code_min_length > self.custom_code_max_length {
            return Err(ConfigError::InvalidValue {
                key: "SHORTENER_CUSTOM_CODE_MIN_LENGTH",
                reason: format!(
                    "must be between 1 and SHORTENER_CUSTOM_CODE_MAX_LENGTH ({})",
                    self.custom_code_max_length
                ),
            });
        }
        Ok(())
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            custom_code_min_length: self.custom_code_min_length,
            custom_code_max_length: self.custom_code_max_length,
            ..ValidationRules::default()
        }
    }

    pub fn registry_settings(&self) -> RegistrySettings {
        RegistrySettings {
            code_length: self.code_length,
            max_generation_attempts: self.max_generation_attempts,
        }
    }
}

// Remote log collector
#[derive(Debug, Clone)]
pub struct LogSinkConfig {
    pub enabled: bool,
    pub endpoint: String,
    pub stack: LogStack,
    pub timeout: Duration,
}

// Config struct that matches our environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub app: AppConfig,
    pub shortener: ShortenerConfig,
    pub log_sink: LogSinkConfig,
}

impl Config {
    // Load configuration from environment variables, `.env` must already be applied
    pub fn load() -> ConfigResult<Self> {
        // Create the server config
        let server = ServerConfig {
            host: get_env_or_default("SERVER_HOST", "127.0.0.1")?,
            port: get_env_or_default("SERVER_PORT", "5000")?,
            workers: get_env_or_default("SERVER_WORKERS", "4")?,
            cors_allowed_origin: get_env_or_default("CORS_ALLOWED_ORIGIN", "http://localhost:3000")?,
        };

        // Get version from Cargo.toml or environment
        let version = option_env!("CARGO_PKG_VERSION")
            .unwrap_or("0.1.0")
            .to_string();

        // Create the app config
        let app = AppConfig {
            name: get_env_or_default("APP_NAME", "url-shortener-form")?,
            version: env::var("APP_VERSION").unwrap_or(version),
            environment: get_env_or_default("APP_ENVIRONMENT", "development")?,
            log_level: get_env_or_default("RUST_LOG", "info")?,
        };

        let shortener = ShortenerConfig {
            base_url: get_env_or_default("SHORTENER_BASE_URL", "http://localhost:5000")?,
            default_validity_minutes: get_env_or_default("SHORTENER_DEFAULT_VALIDITY_MINUTES", "30")?,
            max_batch_size: get_env_or_default("SHORTENER_MAX_BATCH_SIZE", "5")?,
            code_length: get_env_or_default("SHORTENER_CODE_LENGTH", "6")?,
            custom_code_min_length: get_env_or_default("SHORTENER_CUSTOM_CODE_MIN_LENGTH", "3")?,
            custom_code_max_length: get_env_or_default("SHORTENER_CUSTOM_CODE_MAX_LENGTH", "12")?,
            max_generation_attempts: get_env_or_default("SHORTENER_MAX_GENERATION_ATTEMPTS", "10")?,
        };
        shortener.validate()?;

        let log_sink = LogSinkConfig {
            enabled: get_env_or_default("LOG_SINK_ENABLED", "false")?,
            endpoint: get_env_or_default(
                "LOG_SINK_ENDPOINT",
                "http://20.244.56.144/evaluation-service/logs",
            )?,
            stack: get_env_or_default("LOG_SINK_STACK", "backend")?,
            timeout: Duration::from_millis(get_env_or_default("LOG_SINK_TIMEOUT_MS", "2000")?),
        };

        let config = Config {
            server,
            app,
            shortener,
            log_sink,
        };
        Ok(config)
    }
}

/// Helper function to get an env variable with a default value
fn get_env_or_default<T: FromStr>(key: &str, default: &str) -> ConfigResult<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| ConfigError::ParseError(format!("Could not parse {}: {}", key, e))),
        Err(env::VarError::NotPresent) => {
            debug!("{} not set, using default: {}", key, default);
            default.parse::<T>().map_err(|e| {
                ConfigError::ParseError(format!("Could not parse default for {}: {}", key, e))
            })
        }
        Err(e) => Err(ConfigError::EnvVarError(e)),
    }
}
