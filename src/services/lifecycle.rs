//! Event lifecycle state machine
//!
//! ```text
//! pending ──approve──▶ approved ◀──reopen_if_space── full
//!    │                     └──────mark_full_if_needed──▶┘
//!    └──decline──▶ declined (terminal)
//! ```

use crate::models::{EventCapacity, EventStatus};
use crate::utils::errors::{EventDeskError, Result};

pub struct EventLifecycle;

impl EventLifecycle {
    /// Status of a freshly submitted event
    pub fn submit() -> EventStatus {
        EventStatus::Pending
    }

    pub fn approve(from: EventStatus) -> Result<EventStatus> {
        Self::from_pending(from, EventStatus::Approved)
    }

    pub fn decline(from: EventStatus) -> Result<EventStatus> {
        Self::from_pending(from, EventStatus::Declined)
    }

    fn from_pending(from: EventStatus, to: EventStatus) -> Result<EventStatus> {
        if from != EventStatus::Pending {
            return Err(EventDeskError::InvalidStateTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(to)
    }

    /// New status when a join filled the last slot of an approved event
    pub fn mark_full_if_needed(status: EventStatus, capacity: &EventCapacity) -> Option<EventStatus> {
        (status == EventStatus::Approved && capacity.current_participants >= capacity.max_participants)
            .then_some(EventStatus::Full)
    }

    /// New status when a leave freed a slot of a full event
    pub fn reopen_if_space(status: EventStatus, capacity: &EventCapacity) -> Option<EventStatus> {
        (status == EventStatus::Full && capacity.current_participants < capacity.max_participants)
            .then_some(EventStatus::Approved)
    }

    /// Organizer edits are locked once an event is published
    pub fn ensure_editable(status: EventStatus) -> Result<()> {
        if status.is_published() {
            return Err(EventDeskError::PolicyViolation(
                "Approved or full events can't be edited.".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_open_for_joining(status: EventStatus) -> bool {
        status == EventStatus::Approved
    }

    /// Every edge of the state machine
    pub fn can_transition(from: EventStatus, to: EventStatus) -> bool {
        matches!(
            (from, to),
            (EventStatus::Pending, EventStatus::Approved)
                | (EventStatus::Pending, EventStatus::Declined)
                | (EventStatus::Approved, EventStatus::Full)
                | (EventStatus::Full, EventStatus::Approved)
        )
    }
}
