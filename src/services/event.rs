//! Event service implementation
//!
//! Organizer submissions and edits, admin review, the shared detail view and
//! the capacity reconciliation run at deploy time.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::database::store::{retry_transient, Store};
use crate::models::*;
use crate::services::auth::{Action, AuthorizationGate};
use crate::services::capacity::{self, CapacityLedger};
use crate::services::lifecycle::EventLifecycle;
use crate::services::media::MediaStore;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::logging;

const MAX_TITLE_LEN: usize = 200;
const MAX_LOCATION_LEN: usize = 200;

/// Everything the shared event page shows
#[derive(Debug, Clone, Serialize)]
pub struct EventDetail {
    pub event: Event,
    pub capacity: Option<EventCapacity>,
    pub joined: bool,
    pub participants: Vec<ParticipantEntry>,
    pub rating: RatingSummary,
}

/// One corrected capacity cache
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacityCorrection {
    pub event_id: i64,
    pub cached: i32,
    pub live: i32,
    pub status_change: Option<(EventStatus, EventStatus)>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReconciliationReport {
    pub checked: usize,
    pub corrections: Vec<CapacityCorrection>,
}

#[derive(Clone)]
pub struct EventService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    media: Arc<dyn MediaStore>,
    settings: Settings,
}

impl EventService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, media: Arc<dyn MediaStore>, settings: Settings) -> Self {
        Self { store, clock, media, settings }
    }

    /// Submit a new event for review
    pub async fn create(&self, actor: &Account, request: CreateEventRequest) -> Result<Event> {
        AuthorizationGate::require(actor, Action::CreateEvent, None)?;

        let title = validate_title(&request.title)?;
        validate_location(&request.location)?;
        capacity::validate_max(request.max_participants)?;

        let image = match request.image {
            Some(ref upload) => Some(self.media.store(upload).await?),
            None => None,
        };

        let new_event = NewEvent {
            organizer_id: actor.id,
            title,
            date: request.date,
            location: request.location.trim().to_string(),
            short_description: request.short_description.clone(),
            image: image.clone(),
            status: EventLifecycle::submit(),
        };
        let max_participants = request.max_participants;

        let created = retry_transient(self.settings.policy.transient_retries, "create_event", || {
            let new_event = new_event.clone();
            async move {
                let mut uow = self.store.begin().await?;
                let event = uow.insert_event(new_event, self.clock.now()).await?;
                uow.insert_capacity_if_absent(EventCapacity {
                    event_id: event.id,
                    max_participants,
                    current_participants: 0,
                })
                .await?;
                uow.commit().await?;
                Ok(event)
            }
        })
        .await;

        match created {
            Ok(event) => {
                logging::log_event_action(event.id, "submitted", actor.id, Some(&event.title));
                Ok(event)
            }
            Err(e) => {
                if let Some(key) = image {
                    if let Err(cleanup) = self.media.remove(&key).await {
                        warn!(key = %key, error = %cleanup, "Failed to remove orphaned event image");
                    }
                }
                Err(e)
            }
        }
    }

    /// Edit an event that is still under review (or declined)
    pub async fn update(&self, actor: &Account, event_id: i64, request: UpdateEventRequest) -> Result<Event> {
        AuthorizationGate::require(actor, Action::UpdateEvent, None)?;

        let title = request.title.as_deref().map(validate_title).transpose()?;
        if let Some(ref location) = request.location {
            validate_location(location)?;
        }
        if let Some(max) = request.max_participants {
            capacity::validate_max(max)?;
        }

        let mut uow = self.store.begin().await?;
        let mut event = uow
            .lock_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;
        AuthorizationGate::require(actor, Action::UpdateEvent, Some(&event))?;
        EventLifecycle::ensure_editable(event.status)?;

        let stored_image = match request.image {
            Some(ref upload) => Some(self.media.store(upload).await?),
            None => None,
        };
        let replaced_image = match stored_image {
            Some(ref key) => event.image.replace(key.clone()),
            None => None,
        };

        if let Some(title) = title {
            event.title = title;
        }
        if let Some(date) = request.date {
            event.date = Some(date);
        }
        if let Some(location) = request.location {
            event.location = location.trim().to_string();
        }
        if let Some(description) = request.short_description {
            event.short_description = description;
        }
        event.updated_at = self.clock.now();

        let new_max = request.max_participants;
        let default_max = new_max.unwrap_or(self.settings.policy.default_max_participants);
        let saved = async {
            uow.save_event(&event).await?;
            let capacity = CapacityLedger::ensure(uow.as_mut(), event_id, default_max).await?;
            if let Some(max) = new_max {
                CapacityLedger::set_max(uow.as_mut(), capacity, max).await?;
            }
            uow.commit().await
        }
        .await;

        if let Err(e) = saved {
            if let Some(key) = stored_image {
                if let Err(cleanup) = self.media.remove(&key).await {
                    warn!(key = %key, error = %cleanup, "Failed to remove orphaned event image");
                }
            }
            return Err(e);
        }

        if let Some(old) = replaced_image {
            if let Err(e) = self.media.remove(&old).await {
                warn!(key = %old, error = %e, "Failed to remove replaced event image");
            }
        }

        logging::log_event_action(event.id, "updated", actor.id, None);
        Ok(event)
    }

    /// Delete an event with its capacity, participations and feedback
    pub async fn delete(&self, actor: &Account, event_id: i64) -> Result<()> {
        AuthorizationGate::require(actor, Action::DeleteEvent, None)?;

        let mut uow = self.store.begin().await?;
        let event = uow
            .lock_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;
        AuthorizationGate::require(actor, Action::DeleteEvent, Some(&event))?;

        uow.delete_event(event_id).await?;
        uow.commit().await?;

        if let Some(key) = event.image {
            if let Err(e) = self.media.remove(&key).await {
                warn!(key = %key, error = %e, "Failed to remove image of deleted event");
            }
        }

        logging::log_event_action(event_id, "deleted", actor.id, None);
        Ok(())
    }

    pub async fn approve(&self, actor: &Account, event_id: i64) -> Result<Event> {
        self.review(actor, event_id, Action::ApproveEvent).await
    }

    pub async fn decline(&self, actor: &Account, event_id: i64) -> Result<Event> {
        self.review(actor, event_id, Action::DeclineEvent).await
    }

    async fn review(&self, actor: &Account, event_id: i64, action: Action) -> Result<Event> {
        AuthorizationGate::require(actor, action, None)?;

        let event = retry_transient(self.settings.policy.transient_retries, "review_event", || async move {
            let mut uow = self.store.begin().await?;
            let mut event = uow
                .lock_event(event_id)
                .await?
                .ok_or(EventDeskError::EventNotFound { event_id })?;

            event.status = match action {
                Action::ApproveEvent => EventLifecycle::approve(event.status)?,
                _ => EventLifecycle::decline(event.status)?,
            };
            event.updated_at = self.clock.now();
            uow.save_event(&event).await?;
            uow.commit().await?;
            Ok(event)
        })
        .await?;

        logging::log_admin_action(actor.id, &action.to_string(), Some(&event_id.to_string()), Some(event.status.as_str()));
        Ok(event)
    }

    /// Review queue of pending submissions
    pub async fn pending_submissions(&self, actor: &Account) -> Result<Vec<Event>> {
        AuthorizationGate::require(actor, Action::ReviewEvents, None)?;

        let mut uow = self.store.begin().await?;
        let events = uow.list_events(&EventQuery::with_status(EventStatus::Pending)).await?;
        uow.commit().await?;
        Ok(events)
    }

    /// Shared detail page of one event
    pub async fn detail(&self, actor: &Account, event_id: i64) -> Result<EventDetail> {
        AuthorizationGate::require(actor, Action::ViewEventDetail, None)?;
        debug!(event_id = event_id, user_id = actor.id, "Loading event detail");

        let mut uow = self.store.begin().await?;
        let event = uow
            .find_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;
        let capacity = uow.find_capacity(event_id).await?;
        let joined = uow.find_participation(actor.id, event_id).await?.is_some();
        let participants = uow.list_participants(event_id).await?;
        let rating = crate::services::feedback::summarize(uow.as_mut(), event_id).await?;
        uow.commit().await?;

        Ok(EventDetail { event, capacity, joined, participants, rating })
    }

    /// Bring every capacity cache and fullness status back in line with the participation set
    pub async fn reconcile(&self) -> Result<ReconciliationReport> {
        let mut uow = self.store.begin().await?;
        let capacities = uow.list_capacities().await?;
        let mut report = ReconciliationReport { checked: capacities.len(), corrections: Vec::new() };

        for cached in capacities {
            let Some(mut event) = uow.lock_event(cached.event_id).await? else {
                continue;
            };
            let Some(capacity) = CapacityLedger::resync(uow.as_mut(), event.id).await? else {
                continue;
            };

            let next = EventLifecycle::mark_full_if_needed(event.status, &capacity)
                .or_else(|| EventLifecycle::reopen_if_space(event.status, &capacity));
            let status_change = match next {
                Some(status) => {
                    let previous = event.status;
                    event.status = status;
                    event.updated_at = self.clock.now();
                    uow.save_event(&event).await?;
                    Some((previous, status))
                }
                None => None,
            };

            if cached.current_participants != capacity.current_participants || status_change.is_some() {
                report.corrections.push(CapacityCorrection {
                    event_id: event.id,
                    cached: cached.current_participants,
                    live: capacity.current_participants,
                    status_change,
                });
            }
        }

        uow.commit().await?;
        info!(checked = report.checked, corrected = report.corrections.len(), "Capacity reconciliation finished");
        Ok(report)
    }
}

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(EventDeskError::InvalidInput("Title is required.".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(EventDeskError::InvalidInput(format!(
            "Title cannot exceed {} characters.",
            MAX_TITLE_LEN
        )));
    }
    Ok(title.to_string())
}

fn validate_location(location: &str) -> Result<()> {
    if location.trim().chars().count() > MAX_LOCATION_LEN {
        return Err(EventDeskError::InvalidInput(format!(
            "Location cannot exceed {} characters.",
            MAX_LOCATION_LEN
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_title() {
        assert_eq!(validate_title("  Shag night ").unwrap(), "Shag night");
        assert!(validate_title("   ").is_err());
        assert!(validate_title(&"x".repeat(201)).is_err());
    }
}
