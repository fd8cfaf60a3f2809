//! Logging configuration and setup
//! 
//! This module provides logging initialization and structured logging utilities
//! for the EventDesk engine.

use tracing::{info, warn, debug};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::config::LoggingConfig;
use crate::utils::errors::{EventDeskError, Result};

/// Initialize logging based on configuration
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the lifetime of the process.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| EventDeskError::Config(format!("Invalid log filter: {}", e)))?;

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout));

    let result = if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(non_blocking))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking))
            .try_init()
    };
    result.map_err(|e| EventDeskError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log event lifecycle and participation actions
pub fn log_event_action(event_id: i64, action: &str, user_id: i64, details: Option<&str>) {
    info!(
        event_id = event_id,
        action = action,
        user_id = user_id,
        details = details,
        "Event action performed"
    );
}

/// Log admin actions
pub fn log_admin_action(admin_id: i64, action: &str, target: Option<&str>, details: Option<&str>) {
    warn!(
        admin_id = admin_id,
        action = action,
        target = target,
        details = details,
        "Admin action performed"
    );
}

/// Log authorization denials
pub fn log_denial(user_id: i64, action: &str, reason: &str) {
    warn!(
        user_id = user_id,
        action = action,
        reason = reason,
        "Authorization denied"
    );
}

/// Log capacity cache corrections
pub fn log_capacity_resync(event_id: i64, cached: i32, live: i32) {
    if cached != live {
        warn!(
            event_id = event_id,
            cached = cached,
            live = live,
            "Capacity cache drifted, corrected from live participations"
        );
    } else {
        debug!(event_id = event_id, count = live, "Capacity cache in sync");
    }
}
