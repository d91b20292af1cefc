//! Configuration for entropy-engine

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Declarative definition locations
    #[serde(default)]
    pub definitions: DefinitionsConfig,

    /// Outbound entropy push configuration
    #[serde(default)]
    pub push: PushConfig,

    /// Bulk reset configuration
    #[serde(default)]
    pub reset: ResetConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    pub listen_addr: SocketAddr,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Prefix of the control API routes
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            enable_cors: true,
            api_prefix: default_api_prefix(),
        }
    }
}

/// Where service and scenario definitions live
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefinitionsConfig {
    /// Services file
    #[serde(default = "default_services_file")]
    pub services_file: PathBuf,

    /// Directory of scenario files
    #[serde(default = "default_scenarios_dir")]
    pub scenarios_dir: PathBuf,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            services_file: default_services_file(),
            scenarios_dir: default_scenarios_dir(),
        }
    }
}

/// Outbound entropy push configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushConfig {
    /// Timeout for a single push in milliseconds
    #[serde(default = "default_push_timeout")]
    pub timeout_ms: u64,
}

impl PushConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for PushConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_push_timeout(),
        }
    }
}

/// Bulk reset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Attempts per (service, kind) pair
    #[serde(default = "default_reset_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts in milliseconds
    #[serde(default = "default_reset_delay")]
    pub retry_delay_ms: u64,
}

impl ResetConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_reset_attempts(),
            retry_delay_ms: default_reset_delay(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_true() -> bool {
    true
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_services_file() -> PathBuf {
    PathBuf::from("services.yml")
}

fn default_scenarios_dir() -> PathBuf {
    PathBuf::from("scenarios")
}

fn default_push_timeout() -> u64 {
    5000
}

fn default_reset_attempts() -> u32 {
    5
}

fn default_reset_delay() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl EngineConfig {
    /// Load configuration from file
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&EngineConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        // Add environment variables with ENTROPY_ prefix, e.g. ENTROPY_RESET__MAX_ATTEMPTS
        builder = builder.add_source(
            config::Environment::with_prefix("ENTROPY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.server.listen_addr.port(), 8000);
        assert_eq!(config.server.api_prefix, "/api");
        assert_eq!(config.definitions.services_file, PathBuf::from("services.yml"));
    }

    #[test]
    fn test_reset_defaults() {
        let config = ResetConfig::default();
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.retry_delay(), Duration::from_millis(100));
        assert_eq!(PushConfig::default().timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_logging_section_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(&path, "[logging]\nlevel = \"debug,hyper=warn\"\njson = true\n").unwrap();

        let config = EngineConfig::load(path.to_str()).unwrap();
        assert_eq!(config.logging.level, "debug,hyper=warn");
        assert!(config.logging.json);
        assert_eq!(LoggingConfig::default().level, "info");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        std::fs::write(
            &path,
            "[reset]\nmax_attempts = 2\n\n[server]\nlisten_addr = \"0.0.0.0:9000\"\n",
        )
        .unwrap();

        let config = EngineConfig::load(path.to_str()).unwrap();
        assert_eq!(config.reset.max_attempts, 2);
        assert_eq!(config.reset.retry_delay_ms, 100);
        assert_eq!(config.server.listen_addr.port(), 9000);
        assert_eq!(config.push.timeout_ms, 5000);
    }
}
