//! Services module
//!
//! This module contains the business logic: role resolution, the
//! authorization gate, the capacity ledger, the event lifecycle and the
//! services built on top of them.

pub mod account;
pub mod auth;
pub mod capacity;
pub mod dashboard;
pub mod event;
pub mod feedback;
pub mod lifecycle;
pub mod media;
pub mod participation;
pub mod role;

// Re-export commonly used services
pub use account::{AccountService, UserFilter};
pub use auth::{Action, AuthorizationGate, Decision, Scope};
pub use capacity::CapacityLedger;
pub use dashboard::{
    AdminDashboard, AttendeeBrowse, DashboardService, EventCard, FeedbackOverviewFilter, OrganizerDashboard,
    OrganizerEventFilter,
};
pub use event::{CapacityCorrection, EventDetail, EventService, ReconciliationReport};
pub use feedback::{EventFeedback, FeedbackOutcome, FeedbackService};
pub use lifecycle::EventLifecycle;
pub use media::{LocalMediaStore, MediaStore};
pub use participation::{JoinOutcome, LeaveOutcome, ParticipationService};
pub use role::RoleResolver;

use std::sync::Arc;

use crate::config::settings::Settings;
use crate::database::store::Store;
use crate::utils::clock::Clock;

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub event_service: EventService,
    pub participation_service: ParticipationService,
    pub feedback_service: FeedbackService,
    pub dashboard_service: DashboardService,
    pub account_service: AccountService,
    store: Arc<dyn Store>,
}

impl ServiceFactory {
    /// Create a new ServiceFactory sharing one store, clock and media backend
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        media: Arc<dyn MediaStore>,
        settings: Settings,
    ) -> Self {
        let event_service = EventService::new(store.clone(), clock.clone(), media, settings.clone());
        let participation_service = ParticipationService::new(store.clone(), clock.clone(), settings.clone());
        let feedback_service = FeedbackService::new(store.clone(), clock.clone(), settings.clone());
        let dashboard_service = DashboardService::new(store.clone(), clock.clone());
        let account_service = AccountService::new(store.clone(), clock, settings);

        Self {
            event_service,
            participation_service,
            feedback_service,
            dashboard_service,
            account_service,
            store,
        }
    }

    /// Health check of the storage backend
    pub async fn health_check(&self) -> ServiceHealthStatus {
        let storage_healthy = match self.store.begin().await {
            Ok(uow) => uow.rollback().await.is_ok(),
            Err(e) => {
                tracing::error!(error = %e, "Storage health check failed");
                false
            }
        };

        ServiceHealthStatus { storage_healthy }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub storage_healthy: bool,
}

impl ServiceHealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.storage_healthy
    }

    /// Get list of unhealthy services
    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if !self.storage_healthy {
            issues.push("Storage backend unavailable".to_string());
        }
        issues
    }
}
