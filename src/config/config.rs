// SPDX-License-Identifier: GPL-3.0-only
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(anyhow::anyhow!("Unknown log format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Registry instance name, used in logs
    pub name: String,

    /// SQLite database path; persistence is disabled when unset
    pub registry_db_path: Option<PathBuf>,

    /// Save after every mutation instead of only on shutdown
    pub persist_on_mutation: bool,

    /// Local API bind address (e.g., "127.0.0.1:8080")
    pub local_api_bind: SocketAddr,

    /// Logging level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log output format (pretty, json)
    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from TOML file with environment variable overrides
    pub fn load() -> anyhow::Result<Self> {
        let config_path = std::env::var("DISCOVERY_CONFIG")
            .unwrap_or_else(|_| "config.toml".to_string());

        let mut config: Config = if std::path::Path::new(&config_path).exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            toml::from_str(&contents)?
        } else {
            // Use default configuration
            Config::default()
        };

        // Apply environment variable overrides
        if let Ok(val) = std::env::var("DISCOVERY_NAME") {
            config.name = val;
        }
        if let Ok(val) = std::env::var("DISCOVERY_REGISTRY_DB_PATH") {
            config.registry_db_path = if val.is_empty() { None } else { Some(PathBuf::from(val)) };
        }
        if let Ok(val) = std::env::var("DISCOVERY_PERSIST_ON_MUTATION") {
            config.persist_on_mutation = val.parse()?;
        }
        if let Ok(val) = std::env::var("DISCOVERY_LOCAL_API_BIND") {
            config.local_api_bind = SocketAddr::from_str(&val)?;
        }
        if let Ok(val) = std::env::var("DISCOVERY_LOG_LEVEL") {
            config.log_level = val;
        }
        if let Ok(val) = std::env::var("DISCOVERY_LOG_FORMAT") {
            config.log_format = val.parse()?;
        }

        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::from("service-discovery"),
            registry_db_path: None,
            persist_on_mutation: true,
            local_api_bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            log_level: String::from("info"),
            log_format: LogFormat::Pretty,
        }
    }
}
