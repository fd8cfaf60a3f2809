//! Error handling for EventDesk
//!
//! This module defines the main error type used throughout the engine
//! and the taxonomy the presentation layer uses to decide how to react.

use thiserror::Error;

/// Main error type for EventDesk
#[derive(Error, Debug)]
pub enum EventDeskError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Policy violation: {0}")]
    PolicyViolation(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Event is full: {event_id}")]
    CapacityFull { event_id: i64 },

    #[error("Account not found: {user_id}")]
    AccountNotFound { user_id: i64 },

    #[error("Event not found: {event_id}")]
    EventNotFound { event_id: i64 },

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for EventDesk operations
pub type Result<T> = std::result::Result<T, EventDeskError>;

/// Which branch of the error taxonomy an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Actor lacks the role or ownership; redirect to a landing page
    Authorization,
    /// Valid actor, invalid transition; warn and abort
    Policy,
    /// Join attempted on a full event
    Capacity,
    /// Unique constraint hit under concurrent requests
    Constraint,
    /// 404-equivalent
    NotFound,
    /// Input failed validation
    Validation,
    /// Storage, configuration or I/O failure
    Infrastructure,
}

impl EventDeskError {
    /// Map the error onto the taxonomy
    pub fn category(&self) -> ErrorCategory {
        match self {
            EventDeskError::PermissionDenied(_) => ErrorCategory::Authorization,
            EventDeskError::PolicyViolation(_) => ErrorCategory::Policy,
            EventDeskError::InvalidStateTransition { .. } => ErrorCategory::Policy,
            EventDeskError::CapacityFull { .. } => ErrorCategory::Capacity,
            EventDeskError::Duplicate(_) => ErrorCategory::Constraint,
            EventDeskError::AccountNotFound { .. } => ErrorCategory::NotFound,
            EventDeskError::EventNotFound { .. } => ErrorCategory::NotFound,
            EventDeskError::InvalidInput(_) => ErrorCategory::Validation,
            EventDeskError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                ErrorCategory::Constraint
            }
            EventDeskError::Database(_) => ErrorCategory::Infrastructure,
            EventDeskError::Migration(_) => ErrorCategory::Infrastructure,
            EventDeskError::Config(_) => ErrorCategory::Infrastructure,
            EventDeskError::Io(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Check if the error is transient storage contention worth one more attempt
    pub fn is_transient(&self) -> bool {
        match self {
            EventDeskError::Database(sqlx::Error::PoolTimedOut) => true,
            EventDeskError::Database(sqlx::Error::Database(db)) => {
                // serialization_failure, deadlock_detected
                matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
            }
            _ => false,
        }
    }

    /// Check if the error is recoverable by redirecting the actor
    pub fn is_recoverable(&self) -> bool {
        !matches!(self.category(), ErrorCategory::Infrastructure)
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Infrastructure => ErrorSeverity::Critical,
            ErrorCategory::Authorization => ErrorSeverity::Warning,
            ErrorCategory::Policy => ErrorSeverity::Warning,
            ErrorCategory::Capacity => ErrorSeverity::Info,
            ErrorCategory::Constraint => ErrorSeverity::Info,
            ErrorCategory::Validation => ErrorSeverity::Info,
            ErrorCategory::NotFound => ErrorSeverity::Error,
        }
    }

    /// Message safe to show to the actor
    pub fn user_message(&self) -> String {
        match self {
            EventDeskError::PermissionDenied(reason) => reason.clone(),
            EventDeskError::PolicyViolation(reason) => reason.clone(),
            EventDeskError::InvalidStateTransition { from, .. } => {
                format!("This event is {} and can no longer be changed that way.", from)
            }
            EventDeskError::CapacityFull { .. } => "This event is already full.".to_string(),
            EventDeskError::Duplicate(what) => format!("{} already exists.", what),
            EventDeskError::InvalidInput(reason) => reason.clone(),
            EventDeskError::EventNotFound { .. } => "Event not found.".to_string(),
            EventDeskError::AccountNotFound { .. } => "User not found.".to_string(),
            _ => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_taxonomy_mapping() {
        assert_eq!(
            EventDeskError::PermissionDenied("x".into()).category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            EventDeskError::CapacityFull { event_id: 1 }.category(),
            ErrorCategory::Capacity
        );
        assert_eq!(
            EventDeskError::InvalidStateTransition { from: "approved".into(), to: "declined".into() }.category(),
            ErrorCategory::Policy
        );
        assert_eq!(EventDeskError::EventNotFound { event_id: 3 }.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_transient_and_recoverable() {
        assert!(EventDeskError::Database(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!EventDeskError::PolicyViolation("late".into()).is_transient());

        assert!(EventDeskError::PolicyViolation("late".into()).is_recoverable());
        assert!(!EventDeskError::Config("bad".into()).is_recoverable());
        assert_eq!(EventDeskError::Config("bad".into()).severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_user_message_hides_infrastructure_details() {
        let err = EventDeskError::Database(sqlx::Error::PoolTimedOut);
        assert!(!err.user_message().contains("pool"));
        assert_eq!(
            EventDeskError::CapacityFull { event_id: 1 }.user_message(),
            "This event is already full."
        );
    }
}
