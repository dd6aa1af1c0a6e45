//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use serde::{Deserialize, Serialize};

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub stats: StatsConfig,
    pub events: EventsConfig,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Stats (hit recording) service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StatsConfig {
    pub url: String,
    pub app_name: String,
    pub timeout_seconds: u64,
    pub enabled: bool,
}

/// Where view deduplication state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewTrackingBackend {
    /// Process-local set, reset on restart
    Memory,
    /// Shared set in Redis, for multi-instance deployments
    Redis,
}

/// Event lifecycle and admission configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EventsConfig {
    pub owner_lead_time_hours: i64,
    pub admin_lead_time_hours: i64,
    pub view_tracking: ViewTrackingBackend,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file_path: String,
    pub max_files: u32,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(config::File::with_name("config").required(false))
            .add_source(config::Environment::with_prefix("RENDEZVOUS").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::RendezvousError> {
        super::validation::validate_settings(self)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/rendezvous".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "rendezvous:".to_string(),
                ttl_seconds: 86400,
            },
            stats: StatsConfig {
                url: "http://localhost:9090".to_string(),
                app_name: "explore-with-me".to_string(),
                timeout_seconds: 5,
                enabled: true,
            },
            events: EventsConfig {
                owner_lead_time_hours: 2,
                admin_lead_time_hours: 1,
                view_tracking: ViewTrackingBackend::Memory,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file_path: "/var/log/rendezvous".to_string(),
                max_files: 5,
            },
        }
    }
}
