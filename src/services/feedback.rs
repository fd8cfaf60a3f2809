//! Feedback service implementation

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::Settings;
use crate::database::store::{retry_transient, Store, UnitOfWork};
use crate::models::*;
use crate::services::auth::{Action, AuthorizationGate};
use crate::services::role::RoleResolver;
use crate::utils::clock::Clock;
use crate::utils::errors::{EventDeskError, Result};
use crate::utils::{helpers, logging};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FeedbackOutcome {
    /// `created` is false when an earlier rating was overwritten
    Saved { feedback: Feedback, created: bool },
    NotJoined,
    Invalid(String),
}

/// Feedback list shown to an event's organizer or an admin
#[derive(Debug, Clone, Serialize)]
pub struct EventFeedback {
    pub event: Event,
    pub rating: RatingSummary,
    pub feedback: Vec<Feedback>,
}

/// Rating summary of one event, read inside the caller's unit of work
pub async fn summarize(uow: &mut dyn UnitOfWork, event_id: i64) -> Result<RatingSummary> {
    let (count, sum) = uow.rating_totals(event_id).await?;
    Ok(RatingSummary { average: helpers::average_rating(sum, count), count })
}

#[derive(Clone)]
pub struct FeedbackService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl FeedbackService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, settings: Settings) -> Self {
        Self { store, clock, settings }
    }

    /// Rate a joined event, replacing any earlier rating by the same attendee
    pub async fn submit(
        &self,
        actor: &Account,
        event_id: i64,
        rating: i32,
        comment: &str,
    ) -> Result<FeedbackOutcome> {
        AuthorizationGate::require(actor, Action::SubmitFeedback, None)?;

        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Ok(FeedbackOutcome::Invalid(format!(
                "Rating must be between {} and {}.",
                MIN_RATING, MAX_RATING
            )));
        }
        let comment = comment.trim().to_string();

        let outcome = retry_transient(self.settings.policy.transient_retries, "submit_feedback", || {
            let comment = comment.clone();
            async move {
                let mut uow = self.store.begin().await?;
                // same row lock as leave, so the participation cannot vanish before the upsert
                let event = uow
                    .lock_event(event_id)
                    .await?
                    .ok_or(EventDeskError::EventNotFound { event_id })?;
                if !event.status.is_published() {
                    return Err(EventDeskError::PolicyViolation(
                        "Feedback is only accepted for approved events.".to_string(),
                    ));
                }
                if uow.find_participation(actor.id, event_id).await?.is_none() {
                    return Ok(FeedbackOutcome::NotJoined);
                }

                let (feedback, created) = uow
                    .upsert_feedback(
                        NewFeedback { event_id, user_id: actor.id, rating, comment },
                        self.clock.now(),
                    )
                    .await?;
                uow.commit().await?;
                Ok(FeedbackOutcome::Saved { feedback, created })
            }
        })
        .await?;

        match outcome {
            FeedbackOutcome::Saved { ref feedback, created } => {
                let verb = if created { "rated" } else { "re-rated" };
                logging::log_event_action(event_id, verb, actor.id, Some(&feedback.rating.to_string()));
            }
            FeedbackOutcome::NotJoined => {
                info!(event_id = event_id, user_id = actor.id, "Feedback refused, not a participant")
            }
            FeedbackOutcome::Invalid(_) => {}
        }
        Ok(outcome)
    }

    /// Average rating of an event, `-` when nobody rated it yet
    pub async fn average(&self, event_id: i64) -> Result<RatingSummary> {
        let mut uow = self.store.begin().await?;
        let summary = summarize(uow.as_mut(), event_id).await?;
        uow.commit().await?;
        Ok(summary)
    }

    /// All feedback of one event, newest first
    pub async fn event_feedback(&self, actor: &Account, event_id: i64) -> Result<EventFeedback> {
        let action = match RoleResolver::resolve(actor) {
            Role::Admin => Action::ViewAllFeedback,
            _ => Action::ViewEventFeedback,
        };
        AuthorizationGate::require(actor, action, None)?;
        debug!(event_id = event_id, user_id = actor.id, "Loading event feedback");

        let mut uow = self.store.begin().await?;
        let event = uow
            .find_event(event_id)
            .await?
            .ok_or(EventDeskError::EventNotFound { event_id })?;
        AuthorizationGate::require(actor, action, Some(&event))?;

        let rating = summarize(uow.as_mut(), event_id).await?;
        let feedback = uow.list_feedback(event_id).await?;
        uow.commit().await?;

        Ok(EventFeedback { event, rating, feedback })
    }
}
