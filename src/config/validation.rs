//! Configuration validation module
//! 
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use crate::utils::errors::{EventDeskError, Result};
use super::Settings;

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_database_config(&settings.database)?;
    validate_logging_config(&settings.logging)?;
    validate_policy_config(&settings.policy)?;
    validate_media_config(&settings.media)?;

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(EventDeskError::Config(
            "Database URL is required".to_string()
        ));
    }
    
    if config.max_connections == 0 {
        return Err(EventDeskError::Config(
            "Max connections must be greater than 0".to_string()
        ));
    }
    
    if config.min_connections > config.max_connections {
        return Err(EventDeskError::Config(
            "Min connections cannot be greater than max connections".to_string()
        ));
    }
    
    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(EventDeskError::Config(
            "Log level is required".to_string()
        ));
    }
    
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(EventDeskError::Config(
            format!("Invalid log level: {}. Valid levels: {:?}", config.level, valid_levels)
        ));
    }
    
    Ok(())
}

/// Validate participation policy
fn validate_policy_config(config: &super::PolicyConfig) -> Result<()> {
    if config.leave_cutoff_days < 0 {
        return Err(EventDeskError::Config(
            "Leave cutoff cannot be negative".to_string()
        ));
    }

    if config.default_max_participants < 1 {
        return Err(EventDeskError::Config(
            "Default max participants must be at least 1".to_string()
        ));
    }

    Ok(())
}

/// Validate media configuration
fn validate_media_config(config: &super::MediaConfig) -> Result<()> {
    if config.upload_dir.is_empty() {
        return Err(EventDeskError::Config(
            "Media upload directory is required".to_string()
        ));
    }

    if config.max_upload_bytes == 0 {
        return Err(EventDeskError::Config(
            "Max upload size must be greater than 0".to_string()
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&Settings::default()).is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.logging.level = "loud".to_string();
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.policy.default_max_participants = 0;
        assert!(validate_settings(&settings).is_err());

        let mut settings = Settings::default();
        settings.database.min_connections = 20;
        assert!(validate_settings(&settings).is_err());
    }
}
