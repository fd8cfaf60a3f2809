//! Dashboard service implementation
//!
//! Read-only views for the three role home pages. Each view is assembled
//! inside a single unit of work so counts and lists agree with each other.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::database::store::{Store, UnitOfWork};
use crate::models::*;
use crate::services::auth::{Action, AuthorizationGate};
use crate::services::feedback::summarize;
use crate::utils::clock::Clock;
use crate::utils::errors::Result;
use crate::utils::helpers;

const UPCOMING_LIMIT: usize = 5;
const TOP_RATED_LIMIT: usize = 5;
const NEXT_WEEK_DAYS: i64 = 7;

/// Event row with its rating, as the listings show it
#[derive(Debug, Clone, Serialize)]
pub struct EventCard {
    pub event: Event,
    pub rating: RatingSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttendeeBrowse {
    pub events: Vec<EventCard>,
    pub joined_ids: HashSet<i64>,
    pub total_joined: usize,
    pub upcoming_joined: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizerDashboard {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub declined: usize,
    pub upcoming: usize,
    pub total_participants: i64,
    pub total_feedback: i64,
    pub upcoming_events: Vec<Event>,
}

/// Organizer listing filter; blank fields are ignored
#[derive(Debug, Clone, Default)]
pub struct OrganizerEventFilter {
    pub status: Option<EventStatus>,
    pub q: Option<String>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    pub total_events: usize,
    pub pending_events: usize,
    pub approved_events: usize,
    pub declined_events: usize,
    pub upcoming_events: usize,
    pub total_users: usize,
    pub attendees: usize,
    pub organizers: usize,
    pub admins: usize,
    pub events_next_week: Vec<Event>,
    pub top_events: Vec<EventCard>,
}

/// Admin feedback overview filter; `q` matches the title or the organizer's names
#[derive(Debug, Clone, Default)]
pub struct FeedbackOverviewFilter {
    pub q: Option<String>,
    pub status: Option<EventStatus>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

impl DashboardService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Approved events an attendee can join, optionally searched by title
    pub async fn browse(&self, actor: &Account, q: Option<&str>) -> Result<AttendeeBrowse> {
        AuthorizationGate::require(actor, Action::BrowseEvents, None)?;
        let today = self.clock.today();

        let mut query = EventQuery::with_status(EventStatus::Approved);
        query.title_contains = helpers::normalize_query(q);

        let mut uow = self.store.begin().await?;
        let events = uow.list_events(&query).await?;
        let events = with_ratings(uow.as_mut(), events).await?;

        let joined = uow.list_user_participations(actor.id).await?;
        let joined_ids: HashSet<i64> = joined.iter().map(|p| p.event_id).collect();
        let mut upcoming_joined = 0;
        for participation in &joined {
            if let Some(event) = uow.find_event(participation.event_id).await? {
                if event.date.is_some_and(|d| d >= today) {
                    upcoming_joined += 1;
                }
            }
        }
        uow.commit().await?;

        debug!(user_id = actor.id, results = events.len(), "Attendee browse");
        Ok(AttendeeBrowse { events, total_joined: joined_ids.len(), joined_ids, upcoming_joined })
    }

    /// Events the attendee has joined, by date
    pub async fn my_events(&self, actor: &Account) -> Result<Vec<EventCard>> {
        AuthorizationGate::require(actor, Action::ListJoinedEvents, None)?;

        let mut uow = self.store.begin().await?;
        let mut events = Vec::new();
        for participation in uow.list_user_participations(actor.id).await? {
            if let Some(event) = uow.find_event(participation.event_id).await? {
                events.push(event);
            }
        }
        sort_by_date(&mut events);
        let cards = with_ratings(uow.as_mut(), events).await?;
        uow.commit().await?;
        Ok(cards)
    }

    pub async fn organizer_dashboard(&self, actor: &Account) -> Result<OrganizerDashboard> {
        AuthorizationGate::require(actor, Action::ViewOrganizerDashboard, None)?;
        let today = self.clock.today();

        let mut uow = self.store.begin().await?;
        let events = uow.list_events(&EventQuery::by_organizer(actor.id)).await?;

        let mut total_participants = 0;
        let mut total_feedback = 0;
        for event in &events {
            total_participants += uow.count_participants(event.id).await?;
            total_feedback += uow.rating_totals(event.id).await?.0;
        }
        uow.commit().await?;

        let count = |status: EventStatus| events.iter().filter(|e| e.status == status).count();
        let upcoming_events: Vec<Event> = events
            .iter()
            .filter(|e| e.date.is_some_and(|d| d >= today))
            .take(UPCOMING_LIMIT)
            .cloned()
            .collect();

        Ok(OrganizerDashboard {
            total: events.len(),
            pending: count(EventStatus::Pending),
            approved: count(EventStatus::Approved),
            declined: count(EventStatus::Declined),
            upcoming: events
                .iter()
                .filter(|e| e.status == EventStatus::Approved && e.date.is_some_and(|d| d >= today))
                .count(),
            total_participants,
            total_feedback,
            upcoming_events,
        })
    }

    pub async fn organizer_events(&self, actor: &Account, filter: OrganizerEventFilter) -> Result<Vec<EventCard>> {
        AuthorizationGate::require(actor, Action::ListOwnEvents, None)?;

        let query = EventQuery {
            status: filter.status,
            organizer_id: Some(actor.id),
            title_contains: helpers::normalize_query(filter.q.as_deref()),
            date_from: filter.date_from,
            date_to: filter.date_to,
        };

        let mut uow = self.store.begin().await?;
        let events = uow.list_events(&query).await?;
        let cards = with_ratings(uow.as_mut(), events).await?;
        uow.commit().await?;
        Ok(cards)
    }

    pub async fn admin_dashboard(&self, actor: &Account) -> Result<AdminDashboard> {
        AuthorizationGate::require(actor, Action::ViewAdminDashboard, None)?;
        let today = self.clock.today();
        let week_from_now = today + Duration::days(NEXT_WEEK_DAYS);

        let mut uow = self.store.begin().await?;
        let events = uow.list_events(&EventQuery::default()).await?;
        let accounts = uow.list_accounts().await?;

        let approved: Vec<Event> = events
            .iter()
            .filter(|e| e.status == EventStatus::Approved)
            .cloned()
            .collect();
        let mut top_events: Vec<EventCard> = with_ratings(uow.as_mut(), approved)
            .await?
            .into_iter()
            .filter(|card| card.rating.count > 0)
            .collect();
        uow.commit().await?;

        top_events.sort_by(|a, b| {
            let avg = |c: &EventCard| c.rating.average.unwrap_or_default();
            avg(b)
                .total_cmp(&avg(a))
                .then_with(|| b.rating.count.cmp(&a.rating.count))
        });
        top_events.truncate(TOP_RATED_LIMIT);

        let count = |status: EventStatus| events.iter().filter(|e| e.status == status).count();
        let role_count = |role: Role| {
            accounts
                .iter()
                .filter(|a| a.profile.as_ref().is_some_and(|p| p.role == role))
                .count()
        };

        Ok(AdminDashboard {
            total_events: events.len(),
            pending_events: count(EventStatus::Pending),
            approved_events: count(EventStatus::Approved),
            declined_events: count(EventStatus::Declined),
            upcoming_events: events.iter().filter(|e| e.date.is_some_and(|d| d >= today)).count(),
            total_users: accounts.len(),
            attendees: role_count(Role::Attendee),
            organizers: role_count(Role::Organizer),
            admins: role_count(Role::Admin),
            events_next_week: events
                .iter()
                .filter(|e| e.date.is_some_and(|d| d >= today && d <= week_from_now))
                .take(UPCOMING_LIMIT)
                .cloned()
                .collect(),
            top_events,
        })
    }

    pub async fn feedback_overview(&self, actor: &Account, filter: FeedbackOverviewFilter) -> Result<Vec<EventCard>> {
        AuthorizationGate::require(actor, Action::ViewAllFeedback, None)?;

        let q = helpers::normalize_query(filter.q.as_deref());
        let query = EventQuery { status: filter.status, ..Default::default() };

        let mut uow = self.store.begin().await?;
        let organizers: HashMap<i64, Account> = uow
            .list_accounts()
            .await?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();
        let events: Vec<Event> = uow
            .list_events(&query)
            .await?
            .into_iter()
            .filter(|event| match q {
                Some(ref needle) => matches_title_or_organizer(event, organizers.get(&event.organizer_id), needle),
                None => true,
            })
            .collect();
        let cards = with_ratings(uow.as_mut(), events).await?;
        uow.commit().await?;
        Ok(cards)
    }
}

async fn with_ratings(uow: &mut dyn UnitOfWork, events: Vec<Event>) -> Result<Vec<EventCard>> {
    let mut cards = Vec::with_capacity(events.len());
    for event in events {
        let rating = summarize(uow, event.id).await?;
        cards.push(EventCard { event, rating });
    }
    Ok(cards)
}

/// Dated events first in ascending order, undated last
fn sort_by_date(events: &mut [Event]) {
    events.sort_by_key(|e| (e.date.is_none(), e.date, e.id));
}

fn matches_title_or_organizer(event: &Event, organizer: Option<&Account>, needle: &str) -> bool {
    if helpers::contains_ignore_case(&event.title, needle) {
        return true;
    }
    organizer.is_some_and(|o| {
        helpers::contains_ignore_case(&o.username, needle)
            || helpers::contains_ignore_case(&o.first_name, needle)
            || helpers::contains_ignore_case(&o.last_name, needle)
    })
}
