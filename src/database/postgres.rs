//! PostgreSQL storage
//!
//! Each unit of work is one `sqlx` transaction. Dropping it without a commit
//! rolls the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};

use crate::database::connection::DatabasePool;
use crate::database::repositories::{
    AccountRepository, CapacityRepository, EventRepository, FeedbackRepository, ParticipationRepository,
};
use crate::database::store::{Store, UnitOfWork};
use crate::models::*;
use crate::utils::errors::Result;

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DatabasePool,
}

impl PgStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn insert_account(&mut self, account: NewAccount, now: DateTime<Utc>) -> Result<Account> {
        AccountRepository::create(&mut self.tx, account, now).await
    }

    async fn find_account(&mut self, user_id: i64) -> Result<Option<Account>> {
        AccountRepository::find_by_id(&mut self.tx, user_id).await
    }

    async fn save_account(&mut self, account: &Account) -> Result<()> {
        AccountRepository::update(&mut self.tx, account).await
    }

    async fn delete_account(&mut self, user_id: i64) -> Result<bool> {
        AccountRepository::delete(&mut self.tx, user_id).await
    }

    async fn list_accounts(&mut self) -> Result<Vec<Account>> {
        AccountRepository::list(&mut self.tx).await
    }

    async fn insert_event(&mut self, event: NewEvent, now: DateTime<Utc>) -> Result<Event> {
        EventRepository::create(&mut self.tx, event, now).await
    }

    async fn find_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        EventRepository::find_by_id(&mut self.tx, event_id).await
    }

    async fn lock_event(&mut self, event_id: i64) -> Result<Option<Event>> {
        EventRepository::find_for_update(&mut self.tx, event_id).await
    }

    async fn save_event(&mut self, event: &Event) -> Result<()> {
        EventRepository::update(&mut self.tx, event).await
    }

    async fn delete_event(&mut self, event_id: i64) -> Result<bool> {
        EventRepository::delete(&mut self.tx, event_id).await
    }

    async fn list_events(&mut self, query: &EventQuery) -> Result<Vec<Event>> {
        EventRepository::list(&mut self.tx, query).await
    }

    async fn find_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        CapacityRepository::find(&mut self.tx, event_id).await
    }

    async fn lock_capacity(&mut self, event_id: i64) -> Result<Option<EventCapacity>> {
        CapacityRepository::find_for_update(&mut self.tx, event_id).await
    }

    async fn insert_capacity_if_absent(&mut self, capacity: EventCapacity) -> Result<EventCapacity> {
        CapacityRepository::insert_if_absent(&mut self.tx, capacity).await
    }

    async fn save_capacity(&mut self, capacity: &EventCapacity) -> Result<()> {
        CapacityRepository::update(&mut self.tx, capacity).await
    }

    async fn list_capacities(&mut self) -> Result<Vec<EventCapacity>> {
        CapacityRepository::list(&mut self.tx).await
    }

    async fn count_participants(&mut self, event_id: i64) -> Result<i64> {
        ParticipationRepository::count(&mut self.tx, event_id).await
    }

    async fn find_participation(&mut self, user_id: i64, event_id: i64) -> Result<Option<Participation>> {
        ParticipationRepository::find(&mut self.tx, user_id, event_id).await
    }

    async fn insert_participation(
        &mut self,
        user_id: i64,
        event_id: i64,
        joined_at: DateTime<Utc>,
    ) -> Result<Option<Participation>> {
        ParticipationRepository::insert(&mut self.tx, user_id, event_id, joined_at).await
    }

    async fn delete_participation(&mut self, user_id: i64, event_id: i64) -> Result<bool> {
        ParticipationRepository::delete(&mut self.tx, user_id, event_id).await
    }

    async fn list_participants(&mut self, event_id: i64) -> Result<Vec<ParticipantEntry>> {
        ParticipationRepository::list_for_event(&mut self.tx, event_id).await
    }

    async fn list_user_participations(&mut self, user_id: i64) -> Result<Vec<Participation>> {
        ParticipationRepository::list_for_user(&mut self.tx, user_id).await
    }

    async fn upsert_feedback(&mut self, feedback: NewFeedback, now: DateTime<Utc>) -> Result<(Feedback, bool)> {
        FeedbackRepository::upsert(&mut self.tx, feedback, now).await
    }

    async fn list_feedback(&mut self, event_id: i64) -> Result<Vec<Feedback>> {
        FeedbackRepository::list_for_event(&mut self.tx, event_id).await
    }

    async fn rating_totals(&mut self, event_id: i64) -> Result<(i64, i64)> {
        FeedbackRepository::totals(&mut self.tx, event_id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
