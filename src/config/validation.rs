//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{RendezvousError, Result};
use super::settings::ViewTrackingBackend;
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_stats_config(&settings.stats)?;
    validate_events_config(&settings.events)?;
    validate_logging_config(&settings.logging)?;

    if settings.events.view_tracking == ViewTrackingBackend::Redis {
        validate_redis_config(&settings.redis)?;
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(RendezvousError::Config(
            "Database URL is required".to_string()
        ));
    }

    if config.max_connections == 0 {
        return Err(RendezvousError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(RendezvousError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(RendezvousError::Config(
            "Redis URL is required for redis view tracking".to_string()
        ));
    }

    if config.ttl_seconds == 0 {
        return Err(RendezvousError::Config(
            "Redis TTL must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate stats service configuration
fn validate_stats_config(config: &super::StatsConfig) -> Result<()> {
    if config.app_name.is_empty() {
        return Err(RendezvousError::Config(
            "Stats app name is required".to_string()
        ));
    }

    if !config.enabled {
        return Ok(());
    }

    if config.url.is_empty() {
        return Err(RendezvousError::Config(
            "Stats service URL is required".to_string()
        ));
    }

    if config.timeout_seconds == 0 {
        return Err(RendezvousError::Config(
            "Stats timeout must be greater than 0".to_string()
        ));
    }

    Ok(())
}

/// Validate event lifecycle configuration
fn validate_events_config(config: &super::EventsConfig) -> Result<()> {
    if config.owner_lead_time_hours < 0 || config.admin_lead_time_hours < 0 {
        return Err(RendezvousError::Config(
            "Lead times cannot be negative".to_string()
        ));
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(RendezvousError::Config(
            "Log level is required".to_string()
        ));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(RendezvousError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }

    if config.max_files == 0 {
        return Err(RendezvousError::Config(
            "Log retention must keep at least one file".to_string()
        ));
    }

    Ok(())
}
