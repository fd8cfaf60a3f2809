//! Storage abstraction
//!
//! Every service operation runs inside one [`UnitOfWork`]. A unit of work is
//! either committed as a whole or dropped, which discards all of its writes.

use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::warn;

use crate::models::*;
use crate::utils::errors::Result;

/// Source of units of work
#[async_trait]
pub trait Store: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}

/// Transactional view of the storage
///
/// `lock_*` methods hold a row-level lock on the record until the unit of
/// work ends, serializing concurrent decisions about the same event.
#[async_trait]
pub trait UnitOfWork: Send {
    // Accounts
    async fn insert_account(&mut self, account: NewAccount, now: DateTime<Utc>) -> Result<Account>;
    async fn find_account(&mut self, user_id: i64) -> Result<Option<Account>>;
    async fn save_account(&mut self, account: &Account) -> Result<()>;
    async fn delete_account(&mut self, user_id: i64) -> Result<bool>;
    async fn list_accounts(&mut self) -> Result<Vec<Account>>;

    // Events
    async fn insert_event(&mut self, event: NewEvent, now: DateTime<Utc>) -> Result<Event>;
    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>>;
    async fn lock_event(&mut self, event_id: i64) -> Result<Option<Event>>;
    async fn save_event(&mut self, event: &Event) -> Result<()>;
    async fn delete_event(&mut self, event_id: i64) -> Result<bool>;
    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>>;

    // Capacities
    async fn find_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>>;
    async fn lock_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>>;
    /// Insert unless a record already exists; returns the stored record
    async fn insert_capacity_if_absent(&mut self, capacity: EventCapacity) -> Result<EventCapacity>;
    async fn save_capacity(&mut self, capacity: &EventCapacity) -> Result<()>;
    async fn list_capacities(&mut self) -> Result<Vec<EventCapacity>>;

    // Participations
    async fn count_participants(&mut self, event_id: i64) -> Result<i64>;
    async fn find_participation(&mut self, user_id: i64, event_id: i64) -> Result<Option<Participation>>;
    /// Insert a participation; `None` when one already exists for the pair
    async fn insert_participation(
        &mut self,
        user_id: i64,
        event_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Participation>>;
    async fn delete_participation(&mut self, user_id: i64, event_id: i64) -> Result<bool>;
    async fn list_participants(&mut self, event_id: i64) -> Result<Vec<ParticipantEntry>>;
    async fn list_user_participations(&mut self, user_id: i64) -> Result<Vec<Participation>>;

    // Feedback
    /// Insert or update the feedback of `(event, user)`; the flag is true on insert
    async fn upsert_feedback(&mut self, feedback: NewFeedback, now: DateTime<Utc>) -> Result<(Feedback, bool)>;
    async fn list_feedback(&mut self, event_id: i64) -> Result<Vec<Feedback>>;
    /// `(count, sum of ratings)` for an event
    async fn rating_totals(&mut self, event_id: i64) -> Result<(i64, i64)>;

    async fn commit(self: Box<Self>) -> Result<()>;
    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Run `operation`, repeating it up to `retries` more times after transient contention
pub async fn retry_transient<T, F, Fut>(retries: u32, name: &'static str, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Err(e) if e.is_transient() && attempt < retries => {
                attempt += 1;
                warn!(operation = name, attempt = attempt, error = %e, "Transient storage failure, retrying");
            }
            result => return result,
        }
    }
}
