//! Participation service implementation
//!
//! Join and leave run as one unit of work each. The event row and its
//! capacity row stay locked from the capacity check until commit, so two
//! concurrent joins on the last slot cannot both be admitted.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::database::store::{retry_transient, Store};
use crate::models::*;
use crate::services::auth::{Action, AuthorizationGate};
use crate::services::capacity::CapacityLedger;
use crate::services::lifecycle::EventLifecycle;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::{helpers, logging};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JoinOutcome {
    Joined { capacity: EventCapacity, status: EventStatus },
    AlreadyJoined,
    Full,
}

impl JoinOutcome {
    /// For callers that treat a full event as a capacity conflict; rejoining stays a success
    pub fn into_result(self, event_id: i64) -> Result<JoinOutcome> {
        match self {
            JoinOutcome::Full => Err(EventDeskError::CapacityFull { event_id }),
            outcome => Ok(outcome),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LeaveOutcome {
    Left { capacity: Option<EventCapacity>, status: EventStatus },
    NotJoined,
    TooLate { days_left: i64 },
}

#[derive(Clone)]
pub struct ParticipationService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl ParticipationService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self { store, clock, settings }
    }

    /// Register the actor for an approved event
    pub async fn join(&self, actor: &Account, event_id: i64) -> Result<JoinOutcome> {
        AuthorizationGate::require(actor, Action::JoinEvent, None)?;

        let outcome = retry_transient(self.settings.policy.transient_retries, "join", || {
            self.join_once(actor.id, event_id)
        })
        .await?;

        match outcome {
            JoinOutcome::Joined { ref capacity, status } => {
                logging::log_event_action(
                    event_id,
                    "joined",
                    actor.id,
                    Some(&format!("{}/{} {}", capacity.current_participants, capacity.max_participants, status)),
                );
            }
            JoinOutcome::AlreadyJoined => debug!(event_id = event_id, user_id = actor.id, "Already joined"),
            JoinOutcome::Full => info!(event_id = event_id, user_id = actor.id, "Join refused, event is full"),
        }
        Ok(outcome)
    }

    async fn join_once(&self, user_id: i64, event_id: i64) -> Result<JoinOutcome> {
        let mut uow = self.store.begin().await?;
        let mut event = uow
            .lock_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;

        if uow.find_participation(user_id, event_id).await?.is_some() {
            return Ok(JoinOutcome::AlreadyJoined);
        }
        if event.status == EventStatus::Full {
            return Ok(JoinOutcome::Full);
        }
        if !EventLifecycle::is_open_for_joining(event.status) {
            return Err(EventDeskError::PolicyViolation(
                "This event is not open for registration.".to_string(),
            ));
        }

        let capacity =
            CapacityLedger::lock(uow.as_mut(), event_id, self.settings.policy.default_max_participants).await?;

        // decide on the live count, never on the cache
        let live = CapacityLedger::live_count(uow.as_mut(), event_id).await?;
        if live >= capacity.max_participants {
            // heal a stale cache or status while the rows are locked
            if let Some(synced) = CapacityLedger::resync(uow.as_mut(), event_id).await? {
                if let Some(next) = EventLifecycle::mark_full_if_needed(event.status, &synced) {
                    event.status = next;
                    event.updated_at = self.clock.now();
                    uow.save_event(&event).await?;
                }
            }
            uow.commit().await?;
            return Ok(JoinOutcome::Full);
        }

        if uow.insert_participation(user_id, event_id, self.clock.now()).await?.is_none() {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        let capacity = CapacityLedger::resync(uow.as_mut(), event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;
        if let Some(next) = EventLifecycle::mark_full_if_needed(event.status, &capacity) {
            event.status = next;
            event.updated_at = self.clock.now();
            uow.save_event(&event).await?;
        }

        uow.commit().await?;
        Ok(JoinOutcome::Joined { capacity, status: event.status })
    }

    /// Cancel the actor's registration, at least the cutoff days before the event
    pub async fn leave(&self, actor: &Account, event_id: i64) -> Result<LeaveOutcome> {
        AuthorizationGate::require(actor, Action::LeaveEvent, None)?;

        let outcome = retry_transient(self.settings.policy.transient_retries, "leave", || {
            self.leave_once(actor.id, event_id)
        })
        .await?;

        match outcome {
            LeaveOutcome::Left { status, .. } => {
                logging::log_event_action(event_id, "left", actor.id, Some(status.as_str()));
            }
            LeaveOutcome::NotJoined => debug!(event_id = event_id, user_id = actor.id, "Leave refused, not joined"),
            LeaveOutcome::TooLate { days_left } => {
                info!(event_id = event_id, user_id = actor.id, days_left = days_left, "Leave refused, too close to the event")
            }
        }
        Ok(outcome)
    }

    async fn leave_once(&self, user_id: i64, event_id: i64) -> Result<LeaveOutcome> {
        let mut uow = self.store.begin().await?;
        let mut event = uow
            .lock_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;

        if !event.status.is_published() {
            return Err(EventDeskError::PolicyViolation(
                "This event is not open for registration.".to_string(),
            ));
        }

        if uow.find_participation(user_id, event_id).await?.is_none() {
            return Ok(LeaveOutcome::NotJoined);
        }

        if let Some(date) = event.date {
            let days_left = helpers::days_until(date, self.clock.today());
            if days_left < self.settings.policy.leave_cutoff_days {
                return Ok(LeaveOutcome::TooLate { days_left });
            }
        }

        // legacy events may have no capacity record; nothing to lock then
        uow.lock_capacity(event_id).await?;
        if !uow.delete_participation(user_id, event_id).await? {
            return Ok(LeaveOutcome::NotJoined);
        }

        let capacity = CapacityLedger::resync(uow.as_mut(), event_id).await?;
        if let Some(ref capacity) = capacity {
            if let Some(next) = EventLifecycle::reopen_if_space(event.status, capacity) {
                event.status = next;
                event.updated_at = self.clock.now();
                uow.save_event(&event).await?;
            }
        }

        uow.commit().await?;
        Ok(LeaveOutcome::Left { capacity, status: event.status })
    }
}
