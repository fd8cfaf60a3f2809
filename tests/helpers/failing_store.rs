//! Store wrapper whose commits always fail
//!
//! Every read and write goes to the wrapped `MemoryStore`; `commit` drops
//! the inner unit of work instead, so nothing is persisted.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use eventdesk::database::{MemoryStore, Store, UnitOfWork};
use eventdesk::models::*;
use eventdesk::utils::errors::{EventDeskError, Result};

pub struct CommitFailingStore {
    inner: MemoryStore,
}

impl CommitFailingStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Store for CommitFailingStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(Box::new(CommitFailing(self.inner.begin().await?)))
    }
}

struct CommitFailing(Box<dyn UnitOfWork>);

#[async_trait]
impl UnitOfWork for CommitFailing {
    async fn insert_account(&mut self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        self.0.insert_account(account, now).await
    }

    async fn find_account(&mut self, user_id: i64) -> Result<Option<Account>> {
        self.0.find_account(user_id).await
    }

    async fn save_account(&mut self, account: &Account) -> Result<()> {
        self.0.save_account(account).await
    }

    async fn delete_account(&mut self, user_id: i64) -> Result<bool> {
        self.0.delete_account(user_id).await
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        self.0.list_accounts().await
    }

    async fn insert_event(&mut self, event: NewEvent, now: DateTime<Utc>) -> Result<Event> {
        self.0.insert_event(event, now).await
    }

    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        self.0.find_event(event_id).await
    }

    async fn lock_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        self.0.lock_event(event_id).await
    }

    async fn save_event(&mut self, event: &Event) -> Result<()> {
        self.0.save_event(event).await
    }

    async fn delete_event(&mut self, event_id: i64) -> Result<bool> {
        self.0.delete_event(event_id).await
    }

    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>> {
        self.0.list_events(query).await
    }

    async fn find_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        self.0.find_capacity(event_id).await
    }

    async fn lock_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        self.0.lock_capacity(event_id).await
    }

    async fn insert_capacity_if_absent(&mut self, capacity: EventCapacity) -> Result<EventCapacity> {
        self.0.insert_capacity_if_absent(capacity).await
    }

    async fn save_capacity(&mut self, capacity: &EventCapacity) -> Result<()> {
        self.0.save_capacity(capacity).await
    }

    async fn list_capacities(&mut self) -> Result<Vec<EventCapacity>> {
        self.0.list_capacities().await
    }

    async fn count_participants(&mut self, event_id: i64) -> Result<i64> {
        self.0.count_participants(event_id).await
    }

    async fn find_participation(&mut self, user_id: i64, event_id: i64) -> Result<Option<Participation>> {
        self.0.find_participation(user_id, event_id).await
    }

    async fn insert_participation(
        &mut self,
        user_id: i64,
        event_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Participation>> {
        self.0.insert_participation(user_id, event_id, joined_at).await
    }

    async fn delete_participation(&mut self, user_id: i64, event_id: i64) -> Result<bool> {
        self.0.delete_participation(user_id, event_id).await
    }

    async fn list_participants(&mut self, event_id: i64) -> Result<Vec<ParticipantEntry>> {
        self.0.list_participants(event_id).await
    }

    async fn list_user_participations(&mut self, user_id: i64) -> Result<Vec<Participation>> {
        self.0.list_user_participations(user_id).await
    }

    async fn upsert_feedback(&mut self, feedback: NewFeedback, now: DateTime<Utc>) -> Result<(Feedback, bool)> {
        self.0.upsert_feedback(feedback, now).await
    }

    async fn list_feedback(&mut self, event_id: i64) -> Result<Vec<Feedback>> {
        self.0.list_feedback(event_id).await
    }

    async fn rating_totals(&mut self, event_id: i64) -> Result<(i64, i64)> {
        self.0.rating_totals(event_id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.0.rollback().await?;
        Err(EventDeskError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "commit refused",
        )))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.0.rollback().await
    }
}
