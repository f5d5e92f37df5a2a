use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, error};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Environment (dev, staging, prod)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// CORS allowed origins, comma separated
    pub cors_origins: Option<String>,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Name announced in the startup log
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Database URL
    #[serde(default = "default_db_url")]
    pub db_url: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// Upper bound on a single document store call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,

    /// Document served by the un-scoped `/document` and `/ws` routes
    #[serde(default = "default_doc_id")]
    pub default_doc_id: String,

    #[serde(default = "default_ws_ping_interval_secs")]
    pub ws_ping_interval_secs: u64,

    /// Connections silent for longer than this are evicted from the relay
    #[serde(default = "default_ws_idle_timeout_secs")]
    pub ws_idle_timeout_secs: u64,

    /// Frames buffered per connection before the relay starts dropping
    #[serde(default = "default_ws_outbound_buffer")]
    pub ws_outbound_buffer: usize,
}

impl Config {
    /// Load configuration from environment variables or app.env file
    pub fn load() -> Result<Self, ConfigError> {
        // Try to load from app.env file first
        if std::path::Path::new("app.env").exists() {
            dotenvy::from_filename("app.env").ok();
        } else {
            // Fallback to .env file
            dotenvy::dotenv().ok();
        }

        match envy::from_env::<Config>() {
            Ok(config) => {
                info!("✅ Configuration loaded successfully");
                Ok(config)
            }
            Err(e) => {
                error!("❌ Failed to load configuration: {}", e);
                Err(ConfigError::EnvError(e))
            }
        }
    }

    /// Get the full server address
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if running in development mode
    pub fn is_development(&self) -> bool {
        self.environment.to_lowercase() == "dev" || self.environment.to_lowercase() == "development"
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn ws_ping_interval(&self) -> Duration {
        Duration::from_secs(self.ws_ping_interval_secs)
    }

    pub fn ws_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.ws_idle_timeout_secs)
    }

    /// Parsed list of CORS origins, empty when none are configured
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .as_deref()
            .map(|origins| {
                origins
                    .split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            cors_origins: None,
            log_level: default_log_level(),
            service_name: default_service_name(),
            db_url: default_db_url(),
            db_max_connections: default_db_max_connections(),
            store_timeout_ms: default_store_timeout_ms(),
            default_doc_id: default_doc_id(),
            ws_ping_interval_secs: default_ws_ping_interval_secs(),
            ws_idle_timeout_secs: default_ws_idle_timeout_secs(),
            ws_outbound_buffer: default_ws_outbound_buffer(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    EnvError(envy::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::EnvError(e) => write!(f, "Environment variable error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_service_name() -> String {
    "collab-doc".to_string()
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_db_url() -> String {
    "sqlite://collab-doc.db?mode=rwc".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

fn default_store_timeout_ms() -> u64 {
    5_000
}

fn default_doc_id() -> String {
    "main-doc-1".to_string()
}

fn default_ws_ping_interval_secs() -> u64 {
    30
}

fn default_ws_idle_timeout_secs() -> u64 {
    90
}

fn default_ws_outbound_buffer() -> usize {
    256
}
